use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

use crate::error::{StoreError, TimerError};
use crate::models::{NewSession, SessionRecord};
use crate::motivation::{MotivationClient, MotivationRequest};
use crate::store::SessionStore;
use crate::timer::TimerController;

/// Upper bound on the whole motivation attempt so a hung call can never
/// stall the save flow.
const MOTIVATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Timer(#[from] TimerError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Turns a stopped timer run plus the user's annotations into a committed
/// record: one bounded motivation attempt, then a single store append. A
/// record is either fully written (with or without motivation) or not
/// written at all.
pub struct SessionRecorder<S, M> {
    timer: TimerController,
    store: S,
    motivation: M,
    motivation_timeout: Duration,
}

impl<S, M> SessionRecorder<S, M>
where
    S: SessionStore,
    M: MotivationClient,
{
    pub fn new(timer: TimerController, store: S, motivation: M) -> Self {
        Self {
            timer,
            store,
            motivation,
            motivation_timeout: MOTIVATION_TIMEOUT,
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.motivation_timeout = timeout;
        self
    }

    /// Save the stopped run under the given name. Requires a Stopped timer;
    /// resets it to Idle once the record is committed.
    pub async fn save(&self, topic: &str, description: &str) -> Result<SessionRecord, SaveError> {
        let outcome = self.timer.stopped_session().await?;
        let motivation = self
            .fetch_motivation(topic, description, outcome.duration_seconds)
            .await;

        let session = NewSession::from_stopped_timer(
            topic,
            description,
            outcome.duration_seconds,
            motivation,
        );
        let record = self.store.append(session).await?;

        self.timer.reset().await;
        info!(
            "Saved session '{}' ({}s, motivation: {})",
            record.topic,
            record.duration,
            record.motivation.is_some()
        );
        Ok(record)
    }

    /// Throw away the stopped run: no store write, no motivation call.
    pub async fn discard(&self) {
        self.timer.reset().await;
    }

    /// One bounded attempt, no retry. Every failure mode collapses to None;
    /// the session saves fine without a message.
    async fn fetch_motivation(
        &self,
        topic: &str,
        description: &str,
        duration_seconds: u64,
    ) -> Option<String> {
        let hours = crate::models::round_hours(duration_seconds);
        let topic = if topic.trim().is_empty() {
            crate::models::DEFAULT_TOPIC
        } else {
            topic
        };
        let request = MotivationRequest::new(topic, hours, description);

        match tokio::time::timeout(self.motivation_timeout, self.motivation.generate(&request))
            .await
        {
            Ok(Ok(message)) => Some(message),
            Ok(Err(err)) => {
                warn!("Motivation unavailable, saving without it: {err}");
                None
            }
            Err(_) => {
                warn!("Motivation call timed out, saving without it");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MotivationError;
    use crate::models::DEFAULT_TOPIC;
    use crate::motivation::DisabledMotivation;
    use crate::store::{MemoryStore, SortOrder};

    struct CannedMotivation(&'static str);

    impl MotivationClient for CannedMotivation {
        async fn generate(&self, _request: &MotivationRequest) -> Result<String, MotivationError> {
            Ok(self.0.to_string())
        }
    }

    struct SlowMotivation;

    impl MotivationClient for SlowMotivation {
        async fn generate(&self, _request: &MotivationRequest) -> Result<String, MotivationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("too late".to_string())
        }
    }

    async fn stopped_timer() -> TimerController {
        let timer = TimerController::new();
        timer.start().await.unwrap();
        timer.stop().await.unwrap();
        timer
    }

    #[tokio::test]
    async fn save_appends_with_motivation() {
        let store = MemoryStore::new();
        let recorder = SessionRecorder::new(
            stopped_timer().await,
            store.clone(),
            CannedMotivation("nice bean counting!"),
        );

        let record = recorder.save("Tax Law", "felt good").await.unwrap();
        assert_eq!(record.topic, "Tax Law");
        assert_eq!(record.motivation.as_deref(), Some("nice bean counting!"));

        let snapshot = store.subscribe(SortOrder::CreatedAsc).current();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn motivation_failure_still_saves() {
        let store = MemoryStore::new();
        let recorder =
            SessionRecorder::new(stopped_timer().await, store.clone(), DisabledMotivation);

        let record = recorder.save("Audit", "").await.unwrap();
        assert!(record.motivation.is_none());
        assert_eq!(store.subscribe(SortOrder::CreatedAsc).current().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_motivation_call_is_bounded() {
        let store = MemoryStore::new();
        let recorder = SessionRecorder::new(stopped_timer().await, store.clone(), SlowMotivation)
            .with_timeout(Duration::from_millis(50));

        let record = recorder.save("FAR", "").await.unwrap();
        assert!(record.motivation.is_none());
    }

    #[tokio::test]
    async fn save_without_a_stopped_timer_is_rejected() {
        let store = MemoryStore::new();
        let recorder =
            SessionRecorder::new(TimerController::new(), store.clone(), DisabledMotivation);

        assert!(matches!(
            recorder.save("x", "").await,
            Err(SaveError::Timer(TimerError::NotStopped))
        ));
        assert!(store.subscribe(SortOrder::CreatedAsc).current().is_empty());
    }

    #[tokio::test]
    async fn discard_writes_nothing_and_resets() {
        let store = MemoryStore::new();
        let timer = stopped_timer().await;
        let recorder = SessionRecorder::new(timer.clone(), store.clone(), DisabledMotivation);

        recorder.discard().await;
        assert!(store.subscribe(SortOrder::CreatedAsc).current().is_empty());
        assert!(timer.stopped_session().await.is_err());
        // Timer is free for the next run.
        assert!(timer.start().await.is_ok());
        timer.reset().await;
    }

    #[tokio::test]
    async fn blank_topic_saves_under_placeholder() {
        let store = MemoryStore::new();
        let recorder =
            SessionRecorder::new(stopped_timer().await, store.clone(), DisabledMotivation);

        let record = recorder.save("  ", "").await.unwrap();
        assert_eq!(record.topic, DEFAULT_TOPIC);
    }

    #[tokio::test]
    async fn save_resets_timer_for_next_run() {
        let store = MemoryStore::new();
        let timer = stopped_timer().await;
        let recorder = SessionRecorder::new(timer.clone(), store, DisabledMotivation);

        recorder.save("one", "").await.unwrap();
        assert!(timer.start().await.is_ok());
        timer.reset().await;
    }
}
