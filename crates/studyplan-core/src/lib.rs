//! # Studyplan Core
//!
//! Study capacity scheduling and spaced-repetition engine:
//!
//! - **Capacity Calendar**: per-day study capacity from a weekday/weekend rule,
//!   pre-loaded with existing commitments
//! - **Distribution**: greedy largest-first placement of study items, split
//!   60/40 into two initial sessions
//! - **Feasibility**: impossible / tight / normal / relaxed classification with
//!   actionable suggestions
//! - **Conflicts**: per-day overload report
//! - **FSRS-6**: 21-parameter spaced repetition for revision intervals
//! - **Revision Chains**: part 1 → part 2 → revision 1 → revision 2 …, linked
//!   by identifiers
//! - **Topic Reconciliation**: link, replace or exclude ad-hoc work that
//!   overlaps a new plan
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use studyplan_core::prelude::*;
//!
//! let storage = Storage::new(None)?;
//! let planner = Planner::new(storage, PlannerConfig::from_env());
//!
//! let range = DateRange::new(start, end).ok_or("empty range")?;
//! let items = vec![StudyItem::new("thermo", "Thermodynamics", 300)];
//!
//! // Look before committing
//! let preview = planner.preview_distribution(&PlanRequest::new(items.clone(), range))?;
//! println!("{}: {}% utilized", preview.scenario(), preview.utilization_percentage);
//!
//! let plan = planner.commit_distribution(&PlanRequest::new(items, range), &[])?;
//!
//! // Later, after studying
//! let outcome = planner.complete_session(&plan.result.sessions[0].id, PerformanceData::default(), Utc::now())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the binary

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod calendar;
pub mod config;
pub mod conflicts;
pub mod distribution;
pub mod feasibility;
pub mod fsrs;
pub mod plan;
pub mod planner;
pub mod repetition;
pub mod revision;
pub mod storage;
pub mod topics;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use plan::{
    Commitment, CommitmentPatch, CommitmentSummary, DateRange, Flag, PerformanceData, Priority,
    ReviewKind, ScheduledSession, SessionType, StudyItem,
};

pub use calendar::{CalendarError, CapacityCalendar, DailyHoursRule, DaySlot, Hold, SlotLookup, SlotRequest};

pub use feasibility::{FeasibilityReport, Scenario, classify, format_minutes};

pub use conflicts::{DayConflict, detect_conflicts};

pub use distribution::{
    DistributionError, DistributionRequest, DistributionResult, FailedPart, PART_ONE_SHARE,
    PlacementFailure, distribute, split_minutes,
};

pub use fsrs::{
    FSRSParameters, FSRSScheduler, FSRSState, LearningState, Rating, ReviewResult, retrievability,
};

pub use repetition::{NextReview, ReviewMode, SpacedRepetition, estimated_duration, session_kind};

pub use revision::{
    ChainError, CompletionContext, FollowUp, RevisionChainBuilder, combined_score, escalation,
    final_rating,
};

pub use topics::{
    ConflictAction, Reconciliation, TopicConflict, TopicConflictReport, detect_topic_conflicts,
    reconcile,
};

pub use storage::{CompletionRecord, NewCommitment, PlanStore, Result, Storage, StorageError};

pub use planner::{
    ChainOutcome, CommittedPlan, CompletionOutcome, PlanRequest, Planner, PlannerError,
};

pub use config::PlannerConfig;

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// FSRS algorithm version
pub const FSRS_VERSION: u8 = 6;

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        ChainOutcome, CommitmentPatch, DailyHoursRule, DateRange, DistributionResult,
        PerformanceData, PlanRequest, PlanStore, Planner, PlannerConfig, PlannerError, Rating,
        ReviewMode, Scenario, ScheduledSession, SessionType, Storage, StorageError, StudyItem,
        TopicConflict,
    };
}
