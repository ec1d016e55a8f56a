pub mod config;
pub mod derive;
pub mod engine;

pub use config::{AnalyticsConfig, AchievementTier, ACHIEVEMENT_TIERS};
pub use derive::{
    derive_stats, AchievementStatus, DailyPoint, DailySeries, DerivedStats, GoalPacing,
};
pub use engine::AnalyticsEngine;
