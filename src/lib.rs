pub mod error;
pub mod format;
pub mod models;
pub mod motivation;
pub mod recorder;
pub mod stats;
pub mod store;
pub mod timer;

use crate::motivation::MotivationClient;
use crate::recorder::{SaveError, SessionRecorder};
use crate::stats::{AnalyticsConfig, AnalyticsEngine, DerivedStats};
use crate::store::{SessionStore, SortOrder};
use crate::timer::{StoppedSession, TimerController, TimerState};

pub use error::{MotivationError, StoreError, TimerError};
pub use models::{Goal, NewSession, SessionRecord};

/// Initialize the log facade from `RUST_LOG`, defaulting to `info`. Safe to
/// call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init();
}

/// Everything wired together: one timer, one recorder, one analytics
/// subscription over the shared store. This is the surface a front end
/// talks to; all of its handles are cheap to clone or share.
pub struct StudyApp<S, M> {
    timer: TimerController,
    recorder: SessionRecorder<S, M>,
    analytics: AnalyticsEngine,
}

impl<S, M> StudyApp<S, M>
where
    S: SessionStore,
    M: MotivationClient,
{
    pub fn new(store: S, motivation: M, config: AnalyticsConfig) -> Self {
        let timer = TimerController::new();
        let analytics =
            AnalyticsEngine::spawn(store.subscribe(SortOrder::CreatedAsc), config);
        let recorder = SessionRecorder::new(timer.clone(), store, motivation);
        Self {
            timer,
            recorder,
            analytics,
        }
    }

    pub fn timer(&self) -> &TimerController {
        &self.timer
    }

    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }

    pub async fn start_session(&self) -> Result<TimerState, TimerError> {
        self.timer.start().await
    }

    pub async fn stop_session(&self) -> Option<StoppedSession> {
        self.timer.stop().await
    }

    pub async fn save_session(
        &self,
        topic: &str,
        description: &str,
    ) -> Result<SessionRecord, SaveError> {
        self.recorder.save(topic, description).await
    }

    pub async fn discard_session(&self) {
        self.recorder.discard().await
    }

    pub fn stats(&self) -> DerivedStats {
        self.analytics.stats()
    }
}
