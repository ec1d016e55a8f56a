use thiserror::Error;

/// The session store could not be reached. Surfaced to the caller as a
/// generic save failure; there is no offline queue or retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(anyhow::Error),
}

/// The motivation text could not be produced. Always recovered silently:
/// the session is saved without a motivation field.
#[derive(Debug, Error)]
pub enum MotivationError {
    #[error("motivation generation unavailable: {0}")]
    Unavailable(String),
}

/// A timer operation was attempted from the wrong state. The UI prevents
/// reaching these, so they are logic errors rather than user-facing messages.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("timer is already running")]
    AlreadyRunning,
    #[error("no stopped session to save")]
    NotStopped,
}
