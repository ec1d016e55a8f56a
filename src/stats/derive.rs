use chrono::{DateTime, NaiveDate, TimeZone, Weekday};
use serde::Serialize;

use crate::models::{Goal, SessionRecord};
use crate::stats::config::{AnalyticsConfig, ACHIEVEMENT_TIERS};

/// Per-tier progress as shown on the achievements panel.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AchievementStatus {
    pub name: &'static str,
    pub threshold_hours: f64,
    pub unlocked: bool,
    /// `total / threshold`, clamped to 100.
    pub progress_percent: f64,
}

/// Hours-per-day arithmetic toward the fixed target date.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalPacing {
    pub days_until_target: i64,
    pub hours_remaining: f64,
    pub hours_per_day: f64,
    pub progress_percent: f64,
}

/// One bar of the daily chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub label: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySeries {
    /// Oldest to newest, at most `chart_days` entries.
    pub points: Vec<DailyPoint>,
    /// Y-axis ceiling: one unit of headroom above the tallest bar.
    pub max_scale: u32,
}

/// Everything derived from the current record set. Recomputed whole on every
/// store change; never independently mutated.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub total_hours: f64,
    pub weekly_hours: f64,
    pub session_count: usize,
    pub longest_duration_seconds: u64,
    pub longest_hours: f64,
    pub achievements: Vec<AchievementStatus>,
    pub highest_tier: Option<&'static str>,
    pub goal_pacing: GoalPacing,
    /// None while total hours sit below the display threshold.
    pub daily_series: Option<DailySeries>,
}

impl DerivedStats {
    /// True when this record is the longest session in the set (ties all
    /// count). Meaningless for records outside the set the stats came from.
    pub fn is_personal_record(&self, record: &SessionRecord) -> bool {
        self.longest_duration_seconds > 0 && record.duration == self.longest_duration_seconds
    }
}

/// Derive every stat from the full record set. Pure and total: the empty set
/// degrades to zeros and an absent chart, and the same inputs always produce
/// the same output. `now` carries the timezone used for week boundaries and
/// daily bucketing, so callers pass `Local::now()` in the app and a fixed
/// instant in tests.
pub fn derive_stats<Tz: TimeZone>(
    records: &[SessionRecord],
    goal: &Goal,
    config: &AnalyticsConfig,
    now: DateTime<Tz>,
) -> DerivedStats {
    let tz = now.timezone();

    let mut total_hours = 0.0;
    let mut longest_duration_seconds = 0u64;
    let mut longest_hours = 0.0f64;
    for record in records {
        total_hours += record.hours;
        if record.duration > longest_duration_seconds {
            longest_duration_seconds = record.duration;
        }
        if record.hours > longest_hours {
            longest_hours = record.hours;
        }
    }

    let week_start = start_of_week(now.date_naive());
    let weekly_hours = records
        .iter()
        .filter(|r| r.created_at.with_timezone(&tz).date_naive() >= week_start)
        .map(|r| r.hours)
        .sum();

    let achievements: Vec<AchievementStatus> = ACHIEVEMENT_TIERS
        .iter()
        .map(|tier| AchievementStatus {
            name: tier.name,
            threshold_hours: tier.threshold_hours,
            unlocked: total_hours >= tier.threshold_hours,
            progress_percent: (total_hours / tier.threshold_hours * 100.0).min(100.0),
        })
        .collect();
    let highest_tier = achievements
        .iter()
        .rev()
        .find(|a| a.unlocked)
        .map(|a| a.name);

    DerivedStats {
        total_hours,
        weekly_hours,
        session_count: records.len(),
        longest_duration_seconds,
        longest_hours,
        achievements,
        highest_tier,
        goal_pacing: derive_goal_pacing(total_hours, goal, config, &now),
        daily_series: derive_daily_series(records, total_hours, config, &tz),
    }
}

fn derive_goal_pacing<Tz: TimeZone>(
    total_hours: f64,
    goal: &Goal,
    config: &AnalyticsConfig,
    now: &DateTime<Tz>,
) -> GoalPacing {
    let seconds_left = (config.target_date.clone() - now.clone().with_timezone(&chrono::Utc))
        .num_seconds();
    let days_until_target = if seconds_left <= 0 {
        0
    } else {
        (seconds_left + 86_399) / 86_400
    };

    let hours_remaining = (goal.target_hours - total_hours).max(0.0);
    let hours_per_day = if days_until_target > 0 {
        hours_remaining / days_until_target as f64
    } else {
        0.0
    };
    let progress_percent = (total_hours / goal.target_hours * 100.0).min(100.0);

    GoalPacing {
        days_until_target,
        hours_remaining,
        hours_per_day,
        progress_percent,
    }
}

fn derive_daily_series<Tz: TimeZone>(
    records: &[SessionRecord],
    total_hours: f64,
    config: &AnalyticsConfig,
    tz: &Tz,
) -> Option<DailySeries> {
    if total_hours < config.chart_min_total_hours {
        return None;
    }

    let mut by_day = std::collections::BTreeMap::<NaiveDate, f64>::new();
    for record in records {
        let day = record.created_at.with_timezone(tz).date_naive();
        *by_day.entry(day).or_insert(0.0) += record.hours;
    }

    let skip = by_day.len().saturating_sub(config.chart_days);
    let points: Vec<DailyPoint> = by_day
        .into_iter()
        .skip(skip)
        .map(|(date, hours)| DailyPoint {
            label: date.format("%b %-d").to_string(),
            date,
            hours,
        })
        .collect();

    let tallest = points.iter().map(|p| p.hours).fold(0.0f64, f64::max);
    let max_scale = (tallest.ceil() as u32).saturating_add(1).max(1);

    Some(DailySeries { points, max_scale })
}

/// Week starts on Sunday, matching how the rest of the app renders dates.
fn start_of_week(today: NaiveDate) -> NaiveDate {
    today.week(Weekday::Sun).first_day()
}
