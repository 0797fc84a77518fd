//! Planner configuration
//!
//! Defaults, overridable from the environment:
//!
//! | Variable                     | Field                        | Default    |
//! |------------------------------|------------------------------|------------|
//! | `STUDYPLAN_USER`             | `user_id`                    | `default`  |
//! | `STUDYPLAN_REVIEW_MODE`      | `review_mode`                | `balanced` |
//! | `STUDYPLAN_WEEKDAY_HOURS`    | `hours.weekday_hours`        | `2.0`      |
//! | `STUDYPLAN_WEEKEND_HOURS`    | `hours.weekend_hours`        | `3.0`      |
//! | `STUDYPLAN_INCLUDE_WEEKENDS` | `hours.include_weekends`     | `true`     |
//!
//! Unparseable values are logged and ignored.

use serde::{Deserialize, Serialize};

use crate::calendar::DailyHoursRule;
use crate::repetition::ReviewMode;

pub const DEFAULT_USER: &str = "default";

/// Settings shared by every planner operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannerConfig {
    pub user_id: String,
    pub review_mode: ReviewMode,
    /// Daily capacity used when a request does not bring its own
    pub hours: DailyHoursRule,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER.to_string(),
            review_mode: ReviewMode::default(),
            hours: DailyHoursRule::default(),
        }
    }
}

impl PlannerConfig {
    /// Defaults overridden by `STUDYPLAN_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(user) = lookup("STUDYPLAN_USER").filter(|u| !u.trim().is_empty()) {
            config.user_id = user.trim().to_string();
        }
        if let Some(mode) = parse_var(&lookup, "STUDYPLAN_REVIEW_MODE") {
            config.review_mode = mode;
        }
        if let Some(hours) = parse_var(&lookup, "STUDYPLAN_WEEKDAY_HOURS").filter(|h| valid_hours(*h)) {
            config.hours.weekday_hours = hours;
        }
        if let Some(hours) = parse_var(&lookup, "STUDYPLAN_WEEKEND_HOURS").filter(|h| valid_hours(*h)) {
            config.hours.weekend_hours = hours;
        }
        if let Some(include) = lookup("STUDYPLAN_INCLUDE_WEEKENDS") {
            match parse_flag(&include) {
                Some(flag) => config.hours.include_weekends = flag,
                None => tracing::warn!("Ignoring STUDYPLAN_INCLUDE_WEEKENDS={}: expected true or false", include),
            }
        }

        config
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}={}: {}", key, raw, e);
            None
        }
    }
}

fn valid_hours(hours: f64) -> bool {
    let ok = hours.is_finite() && (0.0..=24.0).contains(&hours);
    if !ok {
        tracing::warn!("Ignoring daily hours {}: must be between 0 and 24", hours);
    }
    ok
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
