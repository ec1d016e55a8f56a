use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_HOURS: f64 = 30.0;

/// The user's study goal. Held in memory only; resets to the default on
/// restart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub target_hours: f64,
}

impl Default for Goal {
    fn default() -> Self {
        Self {
            target_hours: DEFAULT_TARGET_HOURS,
        }
    }
}

impl Goal {
    /// Non-positive targets are ignored and leave the goal unchanged.
    pub fn set_target_hours(&mut self, hours: f64) -> bool {
        if hours > 0.0 && hours.is_finite() {
            self.target_hours = hours;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_target() {
        let mut goal = Goal::default();
        assert!(!goal.set_target_hours(0.0));
        assert!(!goal.set_target_hours(-5.0));
        assert!(!goal.set_target_hours(f64::NAN));
        assert_eq!(goal.target_hours, DEFAULT_TARGET_HOURS);

        assert!(goal.set_target_hours(45.0));
        assert_eq!(goal.target_hours, 45.0);
    }
}
