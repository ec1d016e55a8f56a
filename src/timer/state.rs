use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimerError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Stopped,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

/// One in-progress session's clock. The monotonic `anchor` is authoritative;
/// `started_at` is wall-clock metadata for the eventual record. Elapsed time
/// shown while running is recomputed on demand, but the saved duration is
/// computed exactly once, at stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub started_at: Option<DateTime<Utc>>,
    /// Final whole-second duration, present only once stopped.
    pub stopped_duration_seconds: Option<u64>,
    #[serde(skip)]
    anchor: Option<Instant>,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            started_at: None,
            stopped_duration_seconds: None,
            anchor: None,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin timing. Rejected unless Idle: a second start while running must
    /// never restart the clock, or the elapsed time so far would be lost.
    pub fn start(&mut self, started_at: DateTime<Utc>, anchor: Instant) -> Result<(), TimerError> {
        if self.status != TimerStatus::Idle {
            return Err(TimerError::AlreadyRunning);
        }
        self.status = TimerStatus::Running;
        self.started_at = Some(started_at);
        self.stopped_duration_seconds = None;
        self.anchor = Some(anchor);
        Ok(())
    }

    /// Display-only elapsed time while running; `None` otherwise.
    pub fn elapsed(&self) -> Option<Duration> {
        match (self.status, self.anchor) {
            (TimerStatus::Running, Some(anchor)) => Some(anchor.elapsed()),
            _ => None,
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed().map(|d| d.as_secs()).unwrap_or(0)
    }

    /// Stop the clock, fixing the authoritative duration as whole elapsed
    /// seconds, rounded down. A no-op from Idle or Stopped.
    pub fn stop(&mut self) {
        if self.status != TimerStatus::Running {
            return;
        }
        let duration = self.anchor.map(|a| a.elapsed().as_secs()).unwrap_or(0);
        self.status = TimerStatus::Stopped;
        self.stopped_duration_seconds = Some(duration);
        self.anchor = None;
    }

    /// Back to Idle from any state, dropping whatever was timed.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_only_from_idle() {
        let mut state = TimerState::new();
        assert!(state.start(Utc::now(), Instant::now()).is_ok());
        assert_eq!(state.status, TimerStatus::Running);
        assert!(matches!(
            state.start(Utc::now(), Instant::now()),
            Err(TimerError::AlreadyRunning)
        ));
    }

    #[test]
    fn second_start_does_not_reset_the_clock() {
        let mut state = TimerState::new();
        state.start(Utc::now(), Instant::now()).unwrap();
        std::thread::sleep(Duration::from_millis(60));

        let _ = state.start(Utc::now(), Instant::now());
        std::thread::sleep(Duration::from_millis(60));

        // Elapsed spans both sleeps; a silent restart would have lost the first.
        assert!(state.elapsed().unwrap() >= Duration::from_millis(110));
    }

    #[test]
    fn stop_without_start_is_a_noop() {
        let mut state = TimerState::new();
        state.stop();
        assert_eq!(state.status, TimerStatus::Idle);
        assert!(state.stopped_duration_seconds.is_none());
    }

    #[test]
    fn stop_fixes_the_duration_once() {
        let mut state = TimerState::new();
        state.start(Utc::now(), Instant::now()).unwrap();
        state.stop();
        assert_eq!(state.status, TimerStatus::Stopped);
        let fixed = state.stopped_duration_seconds;
        assert!(fixed.is_some());

        // A second stop changes nothing.
        state.stop();
        assert_eq!(state.stopped_duration_seconds, fixed);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut state = TimerState::new();
        state.start(Utc::now(), Instant::now()).unwrap();
        state.stop();
        state.reset();
        assert_eq!(state.status, TimerStatus::Idle);
        assert!(state.started_at.is_none());
        assert!(state.stopped_duration_seconds.is_none());
    }

    #[test]
    fn elapsed_is_zero_when_not_running() {
        let state = TimerState::new();
        assert_eq!(state.elapsed_seconds(), 0);
    }
}
