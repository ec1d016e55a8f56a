use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time,
};

use crate::error::TimerError;

use super::{TimerState, TimerStatus};

/// Display heartbeat while the timer runs. Purely presentational; the saved
/// duration comes from [`TimerController::stop`].
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerTick {
    pub elapsed_seconds: u64,
}

/// Outcome of a stopped run, handed to the recorder.
#[derive(Debug, Clone, Copy)]
pub struct StoppedSession {
    pub duration_seconds: u64,
    pub started_at: DateTime<Utc>,
}

/// Owns the timer state machine plus the once-per-second display ticker.
/// There is exactly one in-flight recording session, so the state has a
/// single writer.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_tx: broadcast::Sender<TimerTick>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new() -> Self {
        let (tick_tx, _) = broadcast::channel(8);
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            ticker: Arc::new(Mutex::new(None)),
            tick_tx,
            tick_interval: Duration::from_secs(1),
        }
    }

    pub async fn get_state(&self) -> TimerState {
        self.state.lock().await.clone()
    }

    /// Elapsed display ticks, one per second while running.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TimerTick> {
        self.tick_tx.subscribe()
    }

    pub async fn start(&self) -> Result<TimerState, TimerError> {
        {
            let mut state = self.state.lock().await;
            state.start(Utc::now(), Instant::now())?;
        }

        info!("Timer started");
        self.spawn_ticker().await;
        Ok(self.get_state().await)
    }

    /// Stop the running timer and hand back the fixed duration. A no-op
    /// (returning the prior outcome) when already stopped; `None` when the
    /// timer was never started.
    pub async fn stop(&self) -> Option<StoppedSession> {
        let outcome = {
            let mut state = self.state.lock().await;
            state.stop();
            match (state.stopped_duration_seconds, state.started_at) {
                (Some(duration_seconds), Some(started_at)) => Some(StoppedSession {
                    duration_seconds,
                    started_at,
                }),
                _ => None,
            }
        };

        if outcome.is_some() {
            self.cancel_ticker().await;
            info!(
                "Timer stopped after {}s",
                outcome.map(|o| o.duration_seconds).unwrap_or(0)
            );
        }
        outcome
    }

    /// Discard path: back to Idle with nothing written anywhere.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
        self.cancel_ticker().await;
    }

    /// The fixed duration of a stopped run, if there is one to save.
    pub async fn stopped_session(&self) -> Result<StoppedSession, TimerError> {
        let state = self.state.lock().await;
        if state.status != TimerStatus::Stopped {
            return Err(TimerError::NotStopped);
        }
        match (state.stopped_duration_seconds, state.started_at) {
            (Some(duration_seconds), Some(started_at)) => Ok(StoppedSession {
                duration_seconds,
                started_at,
            }),
            _ => Err(TimerError::NotStopped),
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let tick_tx = self.tick_tx.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            loop {
                interval.tick().await;

                let elapsed_seconds = {
                    let guard = state.lock().await;
                    if guard.status != TimerStatus::Running {
                        break;
                    }
                    guard.elapsed_seconds()
                };

                let _ = tick_tx.send(TimerTick { elapsed_seconds });
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

impl Default for TimerController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_while_running_is_rejected() {
        let timer = TimerController::new();
        timer.start().await.unwrap();
        assert!(matches!(
            timer.start().await,
            Err(TimerError::AlreadyRunning)
        ));
        timer.reset().await;
    }

    #[tokio::test]
    async fn stop_without_start_returns_nothing() {
        let timer = TimerController::new();
        assert!(timer.stop().await.is_none());
    }

    #[tokio::test]
    async fn stop_produces_a_saveable_outcome() {
        let timer = TimerController::new();
        timer.start().await.unwrap();
        let outcome = timer.stop().await.expect("stopped outcome");
        assert!(outcome.duration_seconds < 2);

        let again = timer.stopped_session().await.unwrap();
        assert_eq!(again.duration_seconds, outcome.duration_seconds);
    }

    #[tokio::test]
    async fn reset_discards_a_stopped_run() {
        let timer = TimerController::new();
        timer.start().await.unwrap();
        timer.stop().await;
        timer.reset().await;
        assert!(matches!(
            timer.stopped_session().await,
            Err(TimerError::NotStopped)
        ));
    }

    #[tokio::test]
    async fn ticker_emits_while_running() {
        let timer = TimerController::new();
        let mut ticks = timer.subscribe_ticks();
        timer.start().await.unwrap();

        // The interval fires immediately on the first tick.
        let tick = tokio::time::timeout(Duration::from_secs(2), ticks.recv())
            .await
            .expect("tick within interval")
            .expect("channel open");
        assert_eq!(tick.elapsed_seconds, 0);
        timer.reset().await;
    }
}
