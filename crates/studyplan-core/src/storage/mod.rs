//! Storage Module
//!
//! Persistence collaborator of the planner:
//! - [`PlanStore`], the operations the engine needs from a backing store
//! - [`Storage`], the SQLite implementation
//!
//! The engine only touches storage at the edges of a run: commitments are
//! read before it, sessions and memory states written after it. Each
//! planner operation writes through a single [`PlanStore`] call so a failure
//! leaves nothing half-applied.

mod migrations;
mod sqlite;

pub use migrations::{MIGRATIONS, Migration};
pub use sqlite::{NewCommitment, Storage};

use crate::fsrs::FSRSState;
use crate::plan::{Commitment, CommitmentPatch, CommitmentSummary, DateRange, PerformanceData, ScheduledSession};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Stored JSON could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// PLAN STORE
// ============================================================================

/// Everything written when a session is completed
#[derive(Debug, Clone, Copy)]
pub struct CompletionRecord<'a> {
    pub session_id: &'a str,
    pub performance: &'a PerformanceData,
    /// New follow-up session; the completed one gets a forward link to it
    pub follow_up: Option<&'a ScheduledSession>,
    /// New memory state of the completed session's item
    pub memory_state: Option<(&'a str, &'a FSRSState)>,
}

/// Backing store consumed by the planner
///
/// Implementations serialize their own writes; the engine performs no
/// compare-and-swap.
pub trait PlanStore {
    /// Ad-hoc commitments in range that are neither completed nor discarded
    fn fetch_commitments(&self, user_id: &str, range: &DateRange) -> Result<Vec<CommitmentSummary>>;

    /// Same set as [`PlanStore::fetch_commitments`], with ids and topics
    fn fetch_detailed_commitments(&self, user_id: &str, range: &DateRange) -> Result<Vec<Commitment>>;

    /// Insert new sessions
    fn persist_sessions(&self, user_id: &str, sessions: &[ScheduledSession]) -> Result<()>;

    /// Apply `patch` to the commitment or session `id`
    fn update_commitment(&self, id: &str, patch: &CommitmentPatch) -> Result<()>;

    fn get_session(&self, id: &str) -> Result<Option<ScheduledSession>>;

    /// Stored memory state of a study item, if it was ever reviewed
    fn load_memory_state(&self, user_id: &str, item_id: &str) -> Result<Option<FSRSState>>;

    fn save_memory_state(&self, user_id: &str, item_id: &str, state: &FSRSState) -> Result<()>;

    /// Insert a plan's sessions and apply its commitment patches as one unit
    ///
    /// On error nothing is written.
    fn commit_plan(
        &self,
        user_id: &str,
        sessions: &[ScheduledSession],
        patches: &[(String, CommitmentPatch)],
    ) -> Result<()>;

    /// Mark a session complete together with its follow-up and memory state
    ///
    /// On error nothing is written, so the session stays open and can be
    /// completed again.
    fn record_completion(&self, user_id: &str, record: &CompletionRecord<'_>) -> Result<()>;
}
