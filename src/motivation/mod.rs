mod client;

pub use client::HttpMotivationClient;

use std::future::Future;

use serde::Serialize;

use crate::error::MotivationError;

/// Inputs for the congratulatory message. `hours` travels as the 2-decimal
/// string the record stores, not a float.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotivationRequest {
    pub topic: String,
    pub hours: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MotivationRequest {
    pub fn new(topic: &str, hours: f64, description: &str) -> Self {
        Self {
            topic: topic.to_string(),
            hours: format!("{hours:.2}"),
            description: if description.trim().is_empty() {
                None
            } else {
                Some(description.to_string())
            },
        }
    }
}

/// Produces a short congratulatory message for a finished session, or fails
/// with [`MotivationError::Unavailable`]. Callers treat failure as "save
/// without a message", never as an error to surface.
pub trait MotivationClient: Send + Sync {
    fn generate(
        &self,
        request: &MotivationRequest,
    ) -> impl Future<Output = Result<String, MotivationError>> + Send;
}

/// Client for callers that opt out of motivation messages entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMotivation;

impl MotivationClient for DisabledMotivation {
    async fn generate(&self, _request: &MotivationRequest) -> Result<String, MotivationError> {
        Err(MotivationError::Unavailable(
            "motivation generation disabled".into(),
        ))
    }
}
