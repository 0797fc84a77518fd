//! Feasibility Classifier
//!
//! Compares total required study time against total available capacity.
//! This is a capacity check, not a placement check: a plan can classify as
//! normal and still fail to place an item because of day-by-day
//! fragmentation. Both verdicts are reported side by side.

use serde::{Deserialize, Serialize};

/// Utilization above this ratio leaves no slack for revisions
pub const TIGHT_THRESHOLD: f64 = 0.80;

/// Utilization below this ratio suggests an under-filled plan
pub const RELAXED_THRESHOLD: f64 = 0.40;

/// How the required time compares with the available time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Impossible,
    Tight,
    Normal,
    Relaxed,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Impossible => "impossible",
            Scenario::Tight => "tight",
            Scenario::Normal => "normal",
            Scenario::Relaxed => "relaxed",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict of the classifier, with actionable text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityReport {
    pub scenario: Scenario,
    pub required_minutes: u64,
    pub available_minutes: u64,
    /// round(required / available * 100), 0 when nothing is available
    pub utilization_percentage: u32,
    /// Minutes missing, only for impossible plans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortfall_minutes: Option<u64>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

/// round(required / available * 100), 0 when `available` is 0
pub fn utilization_percentage(required: u64, available: u64) -> u32 {
    if available == 0 {
        return 0;
    }
    (required as f64 / available as f64 * 100.0).round() as u32
}

/// Classify `required` minutes against `available` minutes over `days` days
///
/// Pure: the same inputs always produce the same report.
pub fn classify(required: u64, available: u64, days: usize) -> FeasibilityReport {
    let utilization = utilization_percentage(required, available);
    let ratio = if available == 0 {
        0.0
    } else {
        required as f64 / available as f64
    };

    let mut report = FeasibilityReport {
        scenario: Scenario::Normal,
        required_minutes: required,
        available_minutes: available,
        utilization_percentage: utilization,
        shortfall_minutes: None,
        warnings: Vec::new(),
        suggestions: Vec::new(),
    };

    if required > available {
        let shortfall = required - available;
        report.scenario = Scenario::Impossible;
        report.shortfall_minutes = Some(shortfall);
        report.warnings.push(format!(
            "Not enough time: {} needed but only {} available ({} short)",
            format_minutes(required),
            format_minutes(available),
            format_minutes(shortfall),
        ));
        report.suggestions.push(extend_or_raise(shortfall, available, days));
        report.suggestions.push(format!(
            "Remove or shorten items totalling at least {}",
            format_minutes(shortfall)
        ));
    } else if ratio > TIGHT_THRESHOLD {
        report.scenario = Scenario::Tight;
        report.warnings.push(format!(
            "Plan uses {}% of available time, leaving little slack for revisions or surprises",
            utilization
        ));
    } else if ratio < RELAXED_THRESHOLD {
        report.scenario = Scenario::Relaxed;
        report.warnings.push(format!(
            "Plan uses only {}% of available time; consider adding items or shortening the period",
            utilization
        ));
    }

    report
}

fn extend_or_raise(shortfall: u64, available: u64, days: usize) -> String {
    if days == 0 {
        return "Extend the period or enable more study days".to_string();
    }
    let per_day = shortfall.div_ceil(days as u64);
    let average_day = available / days as u64;
    if average_day == 0 {
        return format!(
            "Raise daily study time by at least {} per day",
            format_minutes(per_day)
        );
    }
    let extra_days = shortfall.div_ceil(average_day);
    format!(
        "Extend the period by about {} day(s), or raise daily study time by {} per day",
        extra_days,
        format_minutes(per_day)
    )
}

/// Human-readable duration, e.g. "2h 05m" or "45m"
pub fn format_minutes(minutes: u64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {:02}m", h, m),
    }
}
