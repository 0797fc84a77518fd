//! Planner
//!
//! Orchestrates runs against a [`PlanStore`]. Reads happen before a run and
//! writes after it; the algorithms in between never touch the store.
//!
//! - [`Planner::preview_distribution`] allows over-capacity placement so
//!   overloads show up as conflicts, and never writes
//! - [`Planner::commit_distribution`] refuses to overbook, then persists the
//!   sessions and applies topic conflict resolutions in one store write
//! - [`Planner::complete_session`] records performance and extends the
//!   revision chain
//! - [`Planner::detect_topic_conflicts`] lists overlaps with ad-hoc work

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calendar::DailyHoursRule;
use crate::config::PlannerConfig;
use crate::distribution::{DistributionError, DistributionRequest, DistributionResult, PlacementFailure, distribute};
use crate::feasibility::{FeasibilityReport, Scenario};
use crate::plan::{CommitmentPatch, DateRange, PerformanceData, ScheduledSession, SessionType, StudyItem};
use crate::repetition::SpacedRepetition;
use crate::revision::{ChainError, CompletionContext, FollowUp, RevisionChainBuilder};
use crate::storage::{CompletionRecord, PlanStore, StorageError};
use crate::topics::{self, TopicConflict, TopicConflictReport};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Planner error type
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Store failure, passed through unchanged
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Run could not start
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),
    /// Required time exceeds available time
    #[error("Plan is not feasible: {}", .report.warnings.join("; "))]
    Infeasible { report: FeasibilityReport },
    /// Nothing fitted without overbooking
    #[error("No study item could be scheduled without exceeding daily capacity")]
    NothingPlaceable { skipped: Vec<PlacementFailure> },
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// ============================================================================
// REQUESTS / OUTCOMES
// ============================================================================

/// Items to plan over a date range
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub items: Vec<StudyItem>,
    pub range: DateRange,
    /// Falls back to the configured rule
    pub hours: Option<DailyHoursRule>,
}

impl PlanRequest {
    pub fn new(items: Vec<StudyItem>, range: DateRange) -> Self {
        Self {
            items,
            range,
            hours: None,
        }
    }

    pub fn with_hours(mut self, hours: DailyHoursRule) -> Self {
        self.hours = Some(hours);
        self
    }
}

/// A persisted plan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedPlan {
    pub plan_id: String,
    pub result: DistributionResult,
    /// Ad-hoc commitments re-tagged into the plan
    pub linked_commitments: usize,
    /// Ad-hoc commitments the plan replaced
    pub discarded_commitments: usize,
}

/// What happened to the revision chain after a completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ChainOutcome {
    /// A new follow-up session was written
    Scheduled(FollowUp),
    /// The follow-up already existed (part 2 created at distribution time)
    Existing(ScheduledSession),
    /// Revision completed without a stored memory state; chain ends here
    PriorStateMissing,
    /// The session was completed before; nothing changed
    AlreadyCompleted { next_session_id: Option<String> },
}

/// Result of [`Planner::complete_session`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub completed: ScheduledSession,
    pub chain: ChainOutcome,
}

impl CompletionOutcome {
    /// The session that follows the completed one, when known
    pub fn next_session(&self) -> Option<&ScheduledSession> {
        match &self.chain {
            ChainOutcome::Scheduled(follow) => Some(&follow.session),
            ChainOutcome::Existing(session) => Some(session),
            ChainOutcome::PriorStateMissing | ChainOutcome::AlreadyCompleted { .. } => None,
        }
    }
}

// ============================================================================
// PLANNER
// ============================================================================

/// Study planner bound to one store and one user
pub struct Planner<S: PlanStore> {
    store: S,
    config: PlannerConfig,
    chain: RevisionChainBuilder,
}

impl<S: PlanStore> Planner<S> {
    pub fn new(store: S, config: PlannerConfig) -> Self {
        let chain = RevisionChainBuilder::new(SpacedRepetition::new(config.review_mode));
        Self { store, config, chain }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn user(&self) -> &str {
        &self.config.user_id
    }

    /// Dry run over the current commitments
    pub fn preview_distribution(&self, request: &PlanRequest) -> Result<DistributionResult, PlannerError> {
        let commitments = self.store.fetch_commitments(self.user(), &request.range)?;
        let result = distribute(&DistributionRequest {
            items: request.items.clone(),
            range: request.range,
            hours: request.hours.unwrap_or(self.config.hours),
            commitments,
            allow_over_capacity: true,
        })?;
        Ok(result)
    }

    /// Distribute and persist, applying each conflict's resolution
    ///
    /// Linked items are not distributed again, replaced commitments free
    /// their capacity before the run, excluded ones keep occupying it.
    pub fn commit_distribution(
        &self,
        request: &PlanRequest,
        conflicts: &[TopicConflict],
    ) -> Result<CommittedPlan, PlannerError> {
        if request.items.is_empty() {
            return Err(PlannerError::InvalidInput("no study items selected".to_string()));
        }
        if let Some(stray) = conflicts
            .iter()
            .find(|c| !request.items.iter().any(|i| i.id == c.item.id))
        {
            return Err(PlannerError::InvalidInput(format!(
                "conflict refers to item {} which is not part of the plan",
                stray.item.id
            )));
        }

        let plan_id = Uuid::new_v4().to_string();
        let existing = self.store.fetch_detailed_commitments(self.user(), &request.range)?;
        let reconciliation = topics::reconcile(&request.items, &existing, conflicts, &plan_id);

        let mut result = distribute(&DistributionRequest {
            items: reconciliation.items_to_distribute.clone(),
            range: request.range,
            hours: request.hours.unwrap_or(self.config.hours),
            commitments: reconciliation.capacity_commitments,
            allow_over_capacity: false,
        })?;

        if result.scenario() == Scenario::Impossible {
            return Err(PlannerError::Infeasible {
                report: result.feasibility,
            });
        }
        if result.sessions.is_empty() && !reconciliation.items_to_distribute.is_empty() {
            return Err(PlannerError::NothingPlaceable {
                skipped: result.skipped,
            });
        }

        for session in &mut result.sessions {
            session.plan_id = Some(plan_id.clone());
        }
        self.store
            .commit_plan(self.user(), &result.sessions, &reconciliation.patches)?;

        let mut linked_commitments = 0;
        let mut discarded_commitments = 0;
        for (_, patch) in &reconciliation.patches {
            match patch {
                CommitmentPatch::AttachToPlan { .. } => linked_commitments += 1,
                CommitmentPatch::Discard => discarded_commitments += 1,
                CommitmentPatch::Complete { .. } => {}
            }
        }

        info!(
            plan_id = %plan_id,
            sessions = result.sessions.len(),
            skipped = result.skipped.len(),
            linked = linked_commitments,
            discarded = discarded_commitments,
            "Committed plan"
        );

        Ok(CommittedPlan {
            plan_id,
            result,
            linked_commitments,
            discarded_commitments,
        })
    }

    /// Mark a session completed and schedule what follows it
    ///
    /// Completing an already-completed session changes nothing.
    pub fn complete_session(
        &self,
        session_id: &str,
        performance: PerformanceData,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome, PlannerError> {
        let mut session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| PlannerError::SessionNotFound(session_id.to_string()))?;

        if session.completed {
            let next_session_id = session.next_id.clone();
            return Ok(CompletionOutcome {
                completed: session,
                chain: ChainOutcome::AlreadyCompleted { next_session_id },
            });
        }

        let existing_next = match (&session.session_type, &session.next_id) {
            (SessionType::InitialPart1, Some(next_id)) => self.store.get_session(next_id)?,
            _ => None,
        };

        let chain = match existing_next {
            Some(next) => {
                self.store.record_completion(self.user(), &CompletionRecord {
                    session_id: &session.id,
                    performance: &performance,
                    follow_up: None,
                    memory_state: None,
                })?;
                ChainOutcome::Existing(next)
            }
            None => self.extend_chain(&mut session, &performance, now)?,
        };

        session.completed = true;
        session.performance = Some(performance);

        let outcome = CompletionOutcome {
            completed: session,
            chain,
        };
        info!(
            session_id = %outcome.completed.id,
            item_id = %outcome.completed.item_id,
            session_type = %outcome.completed.session_type,
            next_date = ?outcome.next_session().map(|s| s.date),
            "Completed session"
        );

        Ok(outcome)
    }

    fn extend_chain(
        &self,
        session: &mut ScheduledSession,
        performance: &PerformanceData,
        now: DateTime<Utc>,
    ) -> Result<ChainOutcome, PlannerError> {
        let parent_performance = match (&session.session_type, &session.parent_id) {
            (SessionType::InitialPart2, Some(parent_id)) => self
                .store
                .get_session(parent_id)?
                .and_then(|parent| parent.performance),
            _ => None,
        };
        let prior_state = match session.session_type {
            SessionType::Revision => self.store.load_memory_state(self.user(), &session.item_id)?,
            _ => None,
        };

        let ctx = CompletionContext {
            performance,
            parent_performance: parent_performance.as_ref(),
            prior_state: prior_state.as_ref(),
            now,
        };

        match self.chain.follow_up(session, &ctx) {
            Ok(follow) => {
                self.store.record_completion(self.user(), &CompletionRecord {
                    session_id: &session.id,
                    performance,
                    follow_up: Some(&follow.session),
                    memory_state: follow
                        .memory_state
                        .as_ref()
                        .map(|state| (session.item_id.as_str(), state)),
                })?;
                session.next_id = Some(follow.session.id.clone());
                Ok(ChainOutcome::Scheduled(follow))
            }
            Err(ChainError::PriorStateMissing { session_id, item_id }) => {
                warn!(
                    session_id = %session_id,
                    item_id = %item_id,
                    "No memory state for revision; chain not extended"
                );
                self.store.record_completion(self.user(), &CompletionRecord {
                    session_id: &session.id,
                    performance,
                    follow_up: None,
                    memory_state: None,
                })?;
                Ok(ChainOutcome::PriorStateMissing)
            }
        }
    }

    /// Ad-hoc commitments in range that overlap the selected items' topics
    pub fn detect_topic_conflicts(
        &self,
        items: &[StudyItem],
        range: &DateRange,
    ) -> Result<TopicConflictReport, PlannerError> {
        let commitments = self.store.fetch_detailed_commitments(self.user(), range)?;
        Ok(topics::detect_topic_conflicts(items, &commitments))
    }
}
