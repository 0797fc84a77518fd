//! Revision chain state machine
//!
//! | Completed          | Follow-up                                   |
//! |--------------------|---------------------------------------------|
//! | initial part 1     | initial part 2, next day, unconditionally   |
//! | initial part 2     | revision 1, from combined part 1+2 scores   |
//! | revision N         | revision N+1, from the stored memory state  |

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scoring::{combined_score, final_rating};
use crate::distribution::PART_ONE_SHARE;
use crate::fsrs::{FSRSState, Rating};
use crate::plan::{Flag, PerformanceData, Priority, ScheduledSession, SessionType};
use crate::repetition::{SpacedRepetition, estimated_duration, session_kind};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Reasons a chain cannot be continued
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    /// Revision completed without a stored memory state for its item
    #[error("No memory state stored for item {item_id} (session {session_id})")]
    PriorStateMissing { session_id: String, item_id: String },
}

// ============================================================================
// TYPES
// ============================================================================

/// What the builder needs to know about a completion
#[derive(Debug, Clone)]
pub struct CompletionContext<'a> {
    pub performance: &'a PerformanceData,
    /// Part 1's recorded performance, when completing part 2
    pub parent_performance: Option<&'a PerformanceData>,
    /// Stored memory state of the item, when completing a revision
    pub prior_state: Option<&'a FSRSState>,
    pub now: DateTime<Utc>,
}

/// The session to create next, plus the scheduler output behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub session: ScheduledSession,
    /// New memory state to store for the item (revisions only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_state: Option<FSRSState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<i32>,
}

// ============================================================================
// BUILDER
// ============================================================================

/// Decides and builds the follow-up to a completed session
#[derive(Debug, Clone, Default)]
pub struct RevisionChainBuilder {
    repetition: SpacedRepetition,
}

impl RevisionChainBuilder {
    pub fn new(repetition: SpacedRepetition) -> Self {
        Self { repetition }
    }

    /// Build the follow-up of `completed`
    ///
    /// The returned session already carries its `parent_id`; attaching the
    /// forward link to `completed` is left to the caller.
    pub fn follow_up(
        &self,
        completed: &ScheduledSession,
        ctx: &CompletionContext<'_>,
    ) -> Result<FollowUp, ChainError> {
        match completed.session_type {
            SessionType::InitialPart1 => Ok(self.second_part(completed, ctx)),
            SessionType::InitialPart2 => Ok(self.first_revision(completed, ctx)),
            SessionType::Revision => self.next_revision(completed, ctx),
        }
    }

    fn second_part(&self, completed: &ScheduledSession, ctx: &CompletionContext<'_>) -> FollowUp {
        let total = (f64::from(completed.duration_minutes) / PART_ONE_SHARE).round() as u32;
        let minutes = total.saturating_sub(completed.duration_minutes);
        let date = ctx.now.date_naive() + Duration::days(1);

        let mut session = ScheduledSession::new(
            completed.item_id.clone(),
            format!("{} (Part 2)", completed.base_title()),
            date,
            minutes,
            SessionType::InitialPart2,
            0,
        );
        inherit(&mut session, completed);

        FollowUp {
            session,
            memory_state: None,
            rating: None,
            interval_days: Some(1),
        }
    }

    fn first_revision(&self, completed: &ScheduledSession, ctx: &CompletionContext<'_>) -> FollowUp {
        let mut parts = Vec::with_capacity(2);
        if let Some(parent) = ctx.parent_performance {
            parts.push(parent);
        }
        parts.push(ctx.performance);
        let rating = ctx
            .performance
            .rating
            .and_then(Rating::from_i32)
            .unwrap_or_else(|| Rating::from_score(combined_score(&parts)));

        self.revision(completed, ctx, None, rating, 1)
    }

    fn next_revision(
        &self,
        completed: &ScheduledSession,
        ctx: &CompletionContext<'_>,
    ) -> Result<FollowUp, ChainError> {
        let prior = ctx.prior_state.ok_or_else(|| ChainError::PriorStateMissing {
            session_id: completed.id.clone(),
            item_id: completed.item_id.clone(),
        })?;
        let rating = final_rating(ctx.performance);

        Ok(self.revision(completed, ctx, Some(prior), rating, completed.revision_number + 1))
    }

    fn revision(
        &self,
        completed: &ScheduledSession,
        ctx: &CompletionContext<'_>,
        prior: Option<&FSRSState>,
        rating: Rating,
        number: u32,
    ) -> FollowUp {
        let next = self.repetition.next_review(prior, rating, ctx.now);
        let kind = session_kind(rating, completed.review_kind);
        let (priority, flag) = escalation(rating);

        let mut title = format!("{} - Revision {}", completed.base_title(), number);
        if let Some(flag) = flag {
            title = format!("{} {}", flag.marker(), title);
        }

        let mut session = ScheduledSession::new(
            completed.item_id.clone(),
            title,
            next.next_date,
            estimated_duration(kind),
            SessionType::Revision,
            number,
        );
        inherit(&mut session, completed);
        session.review_kind = Some(kind);
        session.priority = priority;
        session.flag = flag;

        tracing::debug!(
            item_id = %completed.item_id,
            revision = number,
            rating = %rating,
            kind = %kind,
            interval_days = next.interval_days,
            "Built revision follow-up"
        );

        FollowUp {
            session,
            memory_state: Some(next.next_state),
            rating: Some(rating),
            interval_days: Some(next.interval_days),
        }
    }
}

/// Priority and annotation after a rated outcome
pub fn escalation(rating: Rating) -> (Priority, Option<Flag>) {
    match rating {
        Rating::Again => (Priority::Highest, Some(Flag::Critical)),
        Rating::Hard => (Priority::Elevated, Some(Flag::Reinforce)),
        Rating::Good | Rating::Easy => (Priority::Normal, None),
    }
}

fn inherit(session: &mut ScheduledSession, parent: &ScheduledSession) {
    session.plan_id = parent.plan_id.clone();
    session.topic_ref = parent.topic_ref.clone();
    session.subtopic_ref = parent.subtopic_ref.clone();
    session.parent_id = Some(parent.id.clone());
}
