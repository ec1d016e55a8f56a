mod goal;
mod session;

pub use goal::Goal;
pub use session::{round_hours, NewSession, SessionRecord, DEFAULT_TOPIC};
