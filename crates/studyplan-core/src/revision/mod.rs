//! Revision Chain Module
//!
//! Decides what follows a completed session:
//! - Part 1 is always followed by part 2 on the next day
//! - Part 2 starts the revision chain from the combined initial performance
//! - Each revision schedules the next one from the stored memory state
//!
//! Poor outcomes escalate priority: Again is critical, Hard is reinforced.

mod chain;
mod scoring;

pub use chain::{ChainError, CompletionContext, FollowUp, RevisionChainBuilder, escalation};
pub use scoring::{
    COMPLETION_WEIGHT, FLASHCARD_WEIGHT, NEUTRAL_COMPLETION_SCORE, NEUTRAL_FLASHCARD_SCORE,
    NEUTRAL_QUESTION_SCORE, NEUTRAL_TIME_SCORE, QUESTION_WEIGHT, TIME_WEIGHT, combined_score,
    final_rating,
};
