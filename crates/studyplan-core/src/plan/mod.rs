//! Plan module - Core types and data structures
//!
//! Implements the study-plan data model:
//! - Study items (immutable distribution input)
//! - Commitments already bound to a date (ad-hoc or plan-generated)
//! - Scheduled sessions with revision-chain links
//! - Performance data recorded on completion

mod session;

pub use session::{
    Flag, PerformanceData, Priority, ReviewKind, ScheduledSession, SessionType,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// STUDY ITEMS
// ============================================================================

/// A unit of study work to be distributed over the calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
    /// Stable identifier of the learning item
    pub id: String,
    /// Display title
    pub title: String,
    /// Total study time this item needs (must be > 0)
    pub estimated_minutes: u32,
    /// Topic this item belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_ref: Option<String>,
    /// Subtopic this item belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic_ref: Option<String>,
}

impl StudyItem {
    /// Create an item without topic references
    pub fn new(id: impl Into<String>, title: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            estimated_minutes,
            topic_ref: None,
            subtopic_ref: None,
        }
    }

    /// Attach a topic (and optionally a subtopic) reference
    pub fn with_topic(mut self, topic: impl Into<String>, subtopic: Option<String>) -> Self {
        self.topic_ref = Some(topic.into());
        self.subtopic_ref = subtopic;
        self
    }
}

// ============================================================================
// DATE RANGE
// ============================================================================

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range; `None` when `end` precedes `start`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Check whether a day falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered
    pub fn len_days(&self) -> usize {
        ((self.end - self.start).num_days() + 1).max(0) as usize
    }

    /// Iterate every day of the range in chronological order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

// ============================================================================
// COMMITMENTS
// ============================================================================

/// Work already bound to a date, as seen by the capacity calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentSummary {
    pub date: NaiveDate,
    pub minutes: u32,
    pub title: String,
}

/// An ad-hoc commitment with its topic identity, as seen by the reconciler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    pub id: String,
    pub date: NaiveDate,
    pub minutes: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic_ref: Option<String>,
}

impl Commitment {
    /// Project down to the calendar's view
    pub fn summary(&self) -> CommitmentSummary {
        CommitmentSummary {
            date: self.date,
            minutes: self.minutes,
            title: self.title.clone(),
        }
    }
}

/// A change applied to a stored commitment or session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CommitmentPatch {
    /// Re-tag an ad-hoc commitment so it belongs to a plan
    AttachToPlan { plan_id: String },
    /// Drop an ad-hoc commitment that the plan replaces
    Discard,
    /// Mark a session done, recording performance and its follow-up
    Complete {
        performance: PerformanceData,
        next_session_id: Option<String>,
    },
}
