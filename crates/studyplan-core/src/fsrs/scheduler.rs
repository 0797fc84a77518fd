//! FSRS-6 scheduler - stateful review over the pure formulas

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    DEFAULT_RETENTION, FSRS6_WEIGHTS, initial_difficulty_with_weights,
    initial_stability_with_weights, next_difficulty_with_weights,
    next_forget_stability_with_weights, next_interval_with_decay,
    next_recall_stability_with_weights, retrievability_with_decay,
    same_day_stability_with_weights,
};

// ============================================================================
// RATING
// ============================================================================

/// Discrete recall quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Forgot completely
    Again = 1,
    /// Recalled with serious difficulty
    Hard = 2,
    /// Recalled after some thought
    Good = 3,
    /// Recalled instantly
    Easy = 4,
}

impl Rating {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Map a continuous 0-4 performance score to a rating
    ///
    /// Thresholds are fixed: >= 3.5 Easy, >= 2.5 Good, >= 1.5 Hard, else Again.
    pub fn from_score(score: f64) -> Self {
        if score >= 3.5 {
            Rating::Easy
        } else if score >= 2.5 {
            Rating::Good
        } else if score >= 1.5 {
            Rating::Hard
        } else {
            Rating::Again
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Again => "Again",
            Rating::Hard => "Hard",
            Rating::Good => "Good",
            Rating::Easy => "Easy",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Learning phase of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningState {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl LearningState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LearningState::New => "new",
            LearningState::Learning => "learning",
            LearningState::Review => "review",
            LearningState::Relearning => "relearning",
        }
    }

    pub fn parse_name(s: &str) -> Self {
        match s {
            "learning" => LearningState::Learning,
            "review" => LearningState::Review,
            "relearning" => LearningState::Relearning,
            _ => LearningState::New,
        }
    }
}

/// Memory state of one learning item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FSRSState {
    /// Days until retrievability falls to 90%
    pub stability: f64,
    /// Inherent difficulty (1.0 = easy, 10.0 = hard)
    pub difficulty: f64,
    pub state: LearningState,
    /// Number of reviews
    pub reps: i32,
    /// Number of lapses (Again after learning)
    pub lapses: i32,
    pub last_review: DateTime<Utc>,
    /// Interval assigned at the last review
    pub scheduled_days: i32,
}

impl FSRSState {
    /// Blank card, never reviewed
    pub fn new_card(now: DateTime<Utc>) -> Self {
        Self {
            stability: 0.0,
            difficulty: 0.0,
            state: LearningState::New,
            reps: 0,
            lapses: 0,
            last_review: now,
            scheduled_days: 0,
        }
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Tunable scheduler parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FSRSParameters {
    pub weights: [f64; 21],
    /// Target probability of recall at review time
    pub desired_retention: f64,
    /// Upper bound on any interval, in days
    pub maximum_interval: i32,
    /// Apply the same-day stability update to reviews with 0 elapsed days
    pub enable_short_term: bool,
}

impl Default for FSRSParameters {
    fn default() -> Self {
        Self {
            weights: FSRS6_WEIGHTS,
            desired_retention: DEFAULT_RETENTION,
            maximum_interval: 36500,
            enable_short_term: true,
        }
    }
}

impl FSRSParameters {
    /// Forgetting curve decay (w20)
    pub fn decay(&self) -> f64 {
        self.weights[20]
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// Outcome of one review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub state: FSRSState,
    /// Retrievability at the moment of review
    pub retrievability: f64,
    /// Days until the next review (>= 1)
    pub interval: i32,
    pub is_lapse: bool,
}

/// Outcomes for each possible rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub again: ReviewResult,
    pub hard: ReviewResult,
    pub good: ReviewResult,
    pub easy: ReviewResult,
}

/// FSRS-6 scheduler
#[derive(Debug, Clone, Default)]
pub struct FSRSScheduler {
    params: FSRSParameters,
}

impl FSRSScheduler {
    pub fn new(params: FSRSParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FSRSParameters {
        &self.params
    }

    /// Whole days between `last_review` and `now`, never negative
    pub fn days_since_review(&self, last_review: &DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        ((now - *last_review).num_days()).max(0) as f64
    }

    /// Apply a review with `rating` after `elapsed_days`
    pub fn review(&self, state: &FSRSState, rating: Rating, elapsed_days: f64) -> ReviewResult {
        let w = &self.params.weights;
        let decay = self.params.decay();

        let (stability, difficulty, retrievability, is_lapse) = if state.state == LearningState::New {
            (
                initial_stability_with_weights(rating, w),
                initial_difficulty_with_weights(rating, w),
                1.0,
                false,
            )
        } else {
            let r = retrievability_with_decay(state.stability, elapsed_days, decay);
            let difficulty = next_difficulty_with_weights(state.difficulty, rating, w);
            let stability = if elapsed_days < 1.0 && self.params.enable_short_term {
                same_day_stability_with_weights(state.stability, rating, w)
            } else if rating == Rating::Again {
                next_forget_stability_with_weights(state.difficulty, state.stability, r, w)
            } else {
                next_recall_stability_with_weights(state.difficulty, state.stability, r, rating, w)
            };
            let lapse = rating == Rating::Again && state.state == LearningState::Review;
            (stability, difficulty, r, lapse)
        };

        let interval = self.interval_for(stability);

        let next_state = match (state.state, rating) {
            (_, Rating::Again) if state.state == LearningState::New => LearningState::Learning,
            (LearningState::Review, Rating::Again) => LearningState::Relearning,
            (LearningState::Learning | LearningState::Relearning, Rating::Again) => state.state,
            _ => LearningState::Review,
        };

        ReviewResult {
            state: FSRSState {
                stability,
                difficulty,
                state: next_state,
                reps: state.reps + 1,
                lapses: state.lapses + i32::from(is_lapse),
                last_review: state.last_review,
                scheduled_days: interval,
            },
            retrievability,
            interval,
            is_lapse,
        }
    }

    /// Review results for all four ratings
    pub fn preview_reviews(&self, state: &FSRSState, elapsed_days: f64) -> PreviewResults {
        PreviewResults {
            again: self.review(state, Rating::Again, elapsed_days),
            hard: self.review(state, Rating::Hard, elapsed_days),
            good: self.review(state, Rating::Good, elapsed_days),
            easy: self.review(state, Rating::Easy, elapsed_days),
        }
    }

    fn interval_for(&self, stability: f64) -> i32 {
        let raw = next_interval_with_decay(stability, self.params.desired_retention, self.params.decay());
        (raw.round() as i32).clamp(1, self.params.maximum_interval.max(1))
    }
}
