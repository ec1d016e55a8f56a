use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::MotivationError;

use super::{MotivationClient, MotivationRequest};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const SYSTEM_PROMPT: &str = "The user is studying to become an accountant and \
preparing for the CPA exam. Your job is to acknowledge their feelings and what \
they accomplished in a relatable, kind way. Make silly accounting references \
and be goofy. Don't be overly inspirational - just be a supportive, slightly \
silly friend. Keep it to 2-3 sentences max.";

enum Endpoint {
    /// Talk to the model API directly with a bearer key.
    Direct { api_key: String },
    /// Post to a server-mediated endpoint that holds the credentials.
    Relay { url: String },
}

/// HTTP-backed motivation client. The two endpoints are functionally
/// equivalent; runtime environment decides which one a deployment uses.
pub struct HttpMotivationClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl HttpMotivationClient {
    pub fn direct(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(Endpoint::Direct {
            api_key: api_key.into(),
        })
    }

    pub fn relayed(url: impl Into<String>) -> Self {
        Self::with_endpoint(Endpoint::Relay { url: url.into() })
    }

    fn with_endpoint(endpoint: Endpoint) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, endpoint }
    }

    async fn generate_direct(
        &self,
        api_key: &str,
        request: &MotivationRequest,
    ) -> Result<String, MotivationError> {
        if api_key.trim().is_empty() {
            return Err(MotivationError::Unavailable("missing API key".into()));
        }

        let feeling = request
            .description
            .as_ref()
            .map(|d| format!(" How they're feeling: \"{d}\"."))
            .unwrap_or_default();
        let user_prompt = format!(
            "The user just finished a {}-hour study session on {}.{} Write a \
             short, relatable response that acknowledges what they're feeling \
             and what they accomplished. Include a silly/funny accounting \
             reference.",
            request.hours, request.topic, feeling
        );

        let body = json!({
            "model": MODEL,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
        });

        let response = self
            .http
            .post(OPENAI_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| MotivationError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(MotivationError::Unavailable(format!(
                "completion endpoint returned {}",
                response.status()
            )));
        }

        #[derive(Deserialize)]
        struct Completion {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct Message {
            content: String,
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|err| MotivationError::Unavailable(err.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| MotivationError::Unavailable("completion had no choices".into()))
    }

    async fn generate_relayed(
        &self,
        url: &str,
        request: &MotivationRequest,
    ) -> Result<String, MotivationError> {
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|err| MotivationError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(MotivationError::Unavailable(format!(
                "relay endpoint returned {}",
                response.status()
            )));
        }

        #[derive(Deserialize)]
        struct RelayReply {
            message: String,
        }

        let reply: RelayReply = response
            .json()
            .await
            .map_err(|err| MotivationError::Unavailable(err.to_string()))?;
        Ok(reply.message)
    }
}

impl MotivationClient for HttpMotivationClient {
    async fn generate(&self, request: &MotivationRequest) -> Result<String, MotivationError> {
        match &self.endpoint {
            Endpoint::Direct { api_key } => self.generate_direct(api_key, request).await,
            Endpoint::Relay { url } => self.generate_relayed(url, request).await,
        }
    }
}
