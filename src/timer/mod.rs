pub mod controller;
pub mod state;

pub use controller::{StoppedSession, TimerController, TimerTick};
pub use state::{TimerState, TimerStatus};
