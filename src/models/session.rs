use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOPIC: &str = "Untitled Session";

/// Round fractional hours to 2 decimal places, as stored on the record.
pub fn round_hours(duration_seconds: u64) -> f64 {
    let hours = duration_seconds as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

/// One completed, saved study session. Written exactly once per kept timer
/// run and never updated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub topic: String,
    pub description: String,
    /// Wall-clock elapsed seconds, the authoritative duration.
    pub duration: u64,
    /// `duration / 3600` rounded to 2 decimals, stored for convenience.
    pub hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append input: everything the store assigns itself (`id`, `created_at`)
/// is absent here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub topic: String,
    pub description: String,
    pub duration: u64,
    pub hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
}

impl NewSession {
    /// Build the record to append from a stopped timer outcome. A blank
    /// topic gets the fixed placeholder; `hours` is derived here so the two
    /// duration fields agree by construction.
    pub fn from_stopped_timer(
        topic: &str,
        description: &str,
        duration_seconds: u64,
        motivation: Option<String>,
    ) -> Self {
        let topic = topic.trim();
        Self {
            topic: if topic.is_empty() {
                DEFAULT_TOPIC.to_string()
            } else {
                topic.to_string()
            },
            description: description.to_string(),
            duration: duration_seconds,
            hours: round_hours(duration_seconds),
            motivation,
        }
    }
}
