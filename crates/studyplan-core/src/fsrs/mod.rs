//! FSRS-6 memory model
//!
//! Drives the spacing of revision sessions. Each item carries a stability
//! (days until recall probability drops to the target) and a difficulty;
//! every rated revision updates both and yields the next interval.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! - Retrievability: R = (1 + FACTOR * t / S)^(-w20), FACTOR = 0.9^(-1/w20) - 1
//! - Interval: t = S/FACTOR * (R^(-1/w20) - 1)

mod algorithm;
mod scheduler;

// Formulas, default weights and bounds
pub use algorithm::{
    DEFAULT_DECAY, DEFAULT_RETENTION, FSRS6_WEIGHTS, MAX_DIFFICULTY, MAX_STABILITY, MIN_DIFFICULTY,
    MIN_STABILITY, initial_difficulty, initial_difficulty_with_weights, initial_stability,
    initial_stability_with_weights, next_difficulty, next_difficulty_with_weights,
    next_forget_stability, next_forget_stability_with_weights, next_interval,
    next_interval_with_decay, next_recall_stability, next_recall_stability_with_weights,
    retrievability, retrievability_with_decay, same_day_stability, same_day_stability_with_weights,
};

// Per-item state and review outcomes
pub use scheduler::{
    FSRSParameters, FSRSScheduler, FSRSState, LearningState, PreviewResults, Rating, ReviewResult,
};
