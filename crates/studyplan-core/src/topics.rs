//! Topic Conflict Reconciler
//!
//! Before a plan is committed, selected items are compared against ad-hoc
//! commitments in the target range. A commitment on the same topic becomes
//! a [`TopicConflict`] that the caller resolves:
//!
//! - **link**: the commitment joins the plan as-is; the item is not
//!   distributed again
//! - **replace**: the commitment is discarded and the item is distributed fresh
//! - **exclude**: the commitment stays outside the plan; the item is
//!   distributed normally
//!
//! Matching: two references to the same subtopic always match. A topic-level
//! reference (no subtopic on one side) matches anything under that topic.
//! Different subtopics of one topic do not match.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::plan::{Commitment, CommitmentPatch, CommitmentSummary, StudyItem};

/// How a conflict is resolved on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictAction {
    #[default]
    Link,
    Replace,
    Exclude,
}

impl std::str::FromStr for ConflictAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "link" => Ok(ConflictAction::Link),
            "replace" => Ok(ConflictAction::Replace),
            "exclude" => Ok(ConflictAction::Exclude),
            _ => Err(format!("Unknown conflict action: {}", s)),
        }
    }
}

/// A selected item overlapping existing ad-hoc work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicConflict {
    pub item: StudyItem,
    pub commitments: Vec<Commitment>,
    #[serde(default)]
    pub action: ConflictAction,
}

/// Conflicts plus the ad-hoc commitments nothing matched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicConflictReport {
    pub conflicts: Vec<TopicConflict>,
    pub unrelated_commitments: Vec<Commitment>,
}

impl TopicConflictReport {
    /// Set the action of the conflict for `item_id`; false when there is none
    pub fn resolve(&mut self, item_id: &str, action: ConflictAction) -> bool {
        match self.conflicts.iter_mut().find(|c| c.item.id == item_id) {
            Some(conflict) => {
                conflict.action = action;
                true
            }
            None => false,
        }
    }
}

fn same_topic(item: &StudyItem, commitment: &Commitment) -> bool {
    match (&item.subtopic_ref, &commitment.subtopic_ref) {
        (Some(a), Some(b)) if a == b => true,
        (Some(_), Some(_)) => false,
        _ => match (&item.topic_ref, &commitment.topic_ref) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Pair each item with the ad-hoc commitments on its topic
///
/// A commitment is attributed to the first matching item only, so it can
/// never be linked or discarded twice.
pub fn detect_topic_conflicts(items: &[StudyItem], commitments: &[Commitment]) -> TopicConflictReport {
    let mut claimed: HashSet<&str> = HashSet::new();
    let mut conflicts = Vec::new();

    for item in items {
        let matched: Vec<Commitment> = commitments
            .iter()
            .filter(|c| !claimed.contains(c.id.as_str()) && same_topic(item, c))
            .cloned()
            .collect();
        if matched.is_empty() {
            continue;
        }
        claimed.extend(
            commitments
                .iter()
                .filter(|c| matched.iter().any(|m| m.id == c.id))
                .map(|c| c.id.as_str()),
        );
        conflicts.push(TopicConflict {
            item: item.clone(),
            commitments: matched,
            action: ConflictAction::Link,
        });
    }

    let unrelated_commitments = commitments
        .iter()
        .filter(|c| !claimed.contains(c.id.as_str()))
        .cloned()
        .collect();

    TopicConflictReport {
        conflicts,
        unrelated_commitments,
    }
}

/// What committing a plan with resolved conflicts means for each party
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Items that still need initial sessions
    pub items_to_distribute: Vec<StudyItem>,
    /// Commitments that keep occupying capacity during distribution
    pub capacity_commitments: Vec<CommitmentSummary>,
    /// Store updates to apply once the plan's sessions are persisted
    pub patches: Vec<(String, CommitmentPatch)>,
}

/// Apply resolved conflicts to the item list and the existing commitments
///
/// `existing` is every ad-hoc commitment in range; replaced commitments are
/// dropped from capacity so their minutes are free for the new plan.
/// Conflict commitments missing from `existing` (completed, discarded or
/// deleted since detection) are ignored. A linked item with no commitment
/// left to link is distributed like any other.
pub fn reconcile(
    items: &[StudyItem],
    existing: &[Commitment],
    conflicts: &[TopicConflict],
    plan_id: &str,
) -> Reconciliation {
    let live: HashSet<&str> = existing.iter().map(|c| c.id.as_str()).collect();
    let mut linked_items: HashSet<&str> = HashSet::new();
    let mut discarded: HashSet<&str> = HashSet::new();
    let mut patches = Vec::new();

    for conflict in conflicts {
        let (current, stale): (Vec<&Commitment>, Vec<&Commitment>) = conflict
            .commitments
            .iter()
            .partition(|c| live.contains(c.id.as_str()));
        if !stale.is_empty() {
            warn!(
                item_id = %conflict.item.id,
                stale = ?stale.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
                "Ignoring commitments no longer open"
            );
        }

        match conflict.action {
            ConflictAction::Link if !current.is_empty() => {
                linked_items.insert(conflict.item.id.as_str());
                patches.extend(current.iter().map(|c| {
                    (
                        c.id.clone(),
                        CommitmentPatch::AttachToPlan {
                            plan_id: plan_id.to_string(),
                        },
                    )
                }));
            }
            ConflictAction::Replace => {
                for c in current {
                    discarded.insert(c.id.as_str());
                    patches.push((c.id.clone(), CommitmentPatch::Discard));
                }
            }
            ConflictAction::Link | ConflictAction::Exclude => {}
        }
    }

    Reconciliation {
        items_to_distribute: items
            .iter()
            .filter(|i| !linked_items.contains(i.id.as_str()))
            .cloned()
            .collect(),
        capacity_commitments: existing
            .iter()
            .filter(|c| !discarded.contains(c.id.as_str()))
            .map(Commitment::summary)
            .collect(),
        patches,
    }
}
