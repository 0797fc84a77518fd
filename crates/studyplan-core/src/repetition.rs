//! Spaced-Repetition Scheduler
//!
//! Wraps the FSRS-6 scheduler for study revisions:
//! - An aggressiveness [`ReviewMode`] picks retention target and interval cap
//! - [`SpacedRepetition::next_review`] computes the next date and memory state
//! - [`session_kind`] decides what the next revision asks the learner to do
//!
//! The memory state is opaque to the rest of the crate.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fsrs::{FSRSParameters, FSRSScheduler, FSRSState, Rating};
use crate::plan::ReviewKind;

// ============================================================================
// REVIEW MODE
// ============================================================================

/// How aggressively revisions are spaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// High retention target, short intervals
    Aggressive,
    #[default]
    Balanced,
    /// Lower retention target, long intervals
    Spaced,
}

impl ReviewMode {
    /// Scheduler parameters for this mode
    pub fn parameters(&self) -> FSRSParameters {
        let (desired_retention, maximum_interval) = match self {
            ReviewMode::Aggressive => (0.95, 60),
            ReviewMode::Balanced => (0.90, 180),
            ReviewMode::Spaced => (0.85, 365),
        };
        FSRSParameters {
            desired_retention,
            maximum_interval,
            ..Default::default()
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewMode::Aggressive => "aggressive",
            ReviewMode::Balanced => "balanced",
            ReviewMode::Spaced => "spaced",
        }
    }
}

impl std::fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aggressive" => Ok(ReviewMode::Aggressive),
            "balanced" => Ok(ReviewMode::Balanced),
            "spaced" => Ok(ReviewMode::Spaced),
            _ => Err(format!("Unknown review mode: {}", s)),
        }
    }
}

// ============================================================================
// SCHEDULING
// ============================================================================

/// Result of scheduling the next review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextReview {
    pub next_date: NaiveDate,
    pub next_state: FSRSState,
    pub interval_days: i32,
}

/// FSRS-backed revision scheduler
#[derive(Debug, Clone, Default)]
pub struct SpacedRepetition {
    mode: ReviewMode,
    scheduler: FSRSScheduler,
}

impl SpacedRepetition {
    pub fn new(mode: ReviewMode) -> Self {
        Self {
            mode,
            scheduler: FSRSScheduler::new(mode.parameters()),
        }
    }

    pub fn mode(&self) -> ReviewMode {
        self.mode
    }

    /// Schedule the review after one rated at `now`
    ///
    /// A missing state means a first-ever review, starting from a blank card.
    pub fn next_review(&self, current: Option<&FSRSState>, rating: Rating, now: DateTime<Utc>) -> NextReview {
        let blank;
        let state = match current {
            Some(state) => state,
            None => {
                blank = FSRSState::new_card(now);
                &blank
            }
        };

        let elapsed = self.scheduler.days_since_review(&state.last_review, now);
        let result = self.scheduler.review(state, rating, elapsed);

        let mut next_state = result.state;
        next_state.last_review = now;

        NextReview {
            next_date: (now + Duration::days(i64::from(result.interval))).date_naive(),
            next_state,
            interval_days: result.interval,
        }
    }
}

// ============================================================================
// SESSION KIND
// ============================================================================

/// Pick the next revision's activity from the rating and the previous one
///
/// `last_kind` is `None` when the previous session was initial study.
/// Good alternates between flashcards and questions so the two kinds of
/// practice interleave.
pub fn session_kind(rating: Rating, last_kind: Option<ReviewKind>) -> ReviewKind {
    match rating {
        Rating::Easy => ReviewKind::FlashcardsOnly,
        Rating::Good => match last_kind {
            None | Some(ReviewKind::QuestionsOnly) => ReviewKind::FlashcardsOnly,
            Some(_) => ReviewKind::QuestionsOnly,
        },
        Rating::Hard => ReviewKind::ReadingFlashcards,
        Rating::Again => ReviewKind::ReadingQuestions,
    }
}

/// Minutes budgeted for a revision of `kind`
pub fn estimated_duration(kind: ReviewKind) -> u32 {
    kind.estimated_minutes()
}
