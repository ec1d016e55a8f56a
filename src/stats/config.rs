use chrono::{DateTime, TimeZone, Utc};

/// One row of the achievement ladder: cumulative hours needed and the
/// milestone name it unlocks.
#[derive(Debug, Clone, Copy)]
pub struct AchievementTier {
    pub threshold_hours: f64,
    pub name: &'static str,
}

/// Ascending ladder of milestones. Walked top to bottom when reporting the
/// highest unlocked tier.
pub const ACHIEVEMENT_TIERS: [AchievementTier; 5] = [
    AchievementTier {
        threshold_hours: 5.0,
        name: "Getting Started",
    },
    AchievementTier {
        threshold_hours: 25.0,
        name: "Building Momentum",
    },
    AchievementTier {
        threshold_hours: 50.0,
        name: "Study Warrior",
    },
    AchievementTier {
        threshold_hours: 100.0,
        name: "Marathon Mindset",
    },
    AchievementTier {
        threshold_hours: 200.0,
        name: "CPA Champion",
    },
];

/// Tunable inputs for the derivation pass.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Fixed reference date the goal pacing counts down to.
    pub target_date: DateTime<Utc>,

    /// Hide the daily chart entirely while total tracked hours sit below
    /// this, rather than drawing near-empty bars.
    pub chart_min_total_hours: f64,

    /// How many trailing active days the daily series keeps.
    pub chart_days: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            // October 23, 2025 at 9 AM
            target_date: Utc.with_ymd_and_hms(2025, 10, 23, 9, 0, 0).unwrap(),
            chart_min_total_hours: 1.0,
            chart_days: 7,
        }
    }
}
