//! Performance scoring - collapse recorded performance into one rating

use crate::fsrs::Rating;
use crate::plan::PerformanceData;

/// Weight of the time-on-task sub-score
pub const TIME_WEIGHT: f64 = 0.25;
/// Weight of the flashcard sub-score
pub const FLASHCARD_WEIGHT: f64 = 0.30;
/// Weight of the question sub-score
pub const QUESTION_WEIGHT: f64 = 0.35;
/// Weight of the completion sub-score
pub const COMPLETION_WEIGHT: f64 = 0.10;

/// Neutral values used when a sub-score was never recorded
pub const NEUTRAL_TIME_SCORE: f64 = 3.0;
pub const NEUTRAL_FLASHCARD_SCORE: f64 = 3.0;
pub const NEUTRAL_QUESTION_SCORE: f64 = 3.0;
pub const NEUTRAL_COMPLETION_SCORE: f64 = 4.0;

/// Weighted 0-4 score over one or more sessions' performance
///
/// Each sub-score is averaged over the sessions that recorded it; a
/// sub-score nobody recorded takes its neutral value.
pub fn combined_score(parts: &[&PerformanceData]) -> f64 {
    mean(parts, |p| p.time_score, NEUTRAL_TIME_SCORE) * TIME_WEIGHT
        + mean(parts, |p| p.flashcard_score, NEUTRAL_FLASHCARD_SCORE) * FLASHCARD_WEIGHT
        + mean(parts, |p| p.question_score, NEUTRAL_QUESTION_SCORE) * QUESTION_WEIGHT
        + mean(parts, |p| p.completion_score, NEUTRAL_COMPLETION_SCORE) * COMPLETION_WEIGHT
}

fn mean(parts: &[&PerformanceData], pick: fn(&PerformanceData) -> Option<f64>, neutral: f64) -> f64 {
    let values: Vec<f64> = parts
        .iter()
        .filter_map(|p| pick(p))
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 4.0))
        .collect();
    if values.is_empty() {
        neutral
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Rating of a single completed session
///
/// An explicit, valid rating wins over the sub-scores.
pub fn final_rating(performance: &PerformanceData) -> Rating {
    performance
        .rating
        .and_then(Rating::from_i32)
        .unwrap_or_else(|| Rating::from_score(combined_score(&[performance])))
}
