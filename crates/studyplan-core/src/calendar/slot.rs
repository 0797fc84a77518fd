//! Day Slot - per-day capacity record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::plan::CommitmentSummary;

/// Study capacity of one enumerated calendar day
///
/// `used_minutes` starts at the sum of pre-existing commitments and only
/// grows during a run. Availability is always derived from capacity and
/// usage, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlot {
    pub date: NaiveDate,
    pub total_capacity_minutes: u32,
    used_minutes: u32,
    pub commitments: Vec<CommitmentSummary>,
}

impl DaySlot {
    /// Create an empty slot with the given capacity
    pub fn new(date: NaiveDate, total_capacity_minutes: u32) -> Self {
        Self {
            date,
            total_capacity_minutes,
            used_minutes: 0,
            commitments: Vec::new(),
        }
    }

    /// Minutes committed so far
    pub fn used_minutes(&self) -> u32 {
        self.used_minutes
    }

    /// Remaining capacity, clamped at zero when the day is overbooked
    pub fn available_minutes(&self) -> u32 {
        self.total_capacity_minutes.saturating_sub(self.used_minutes)
    }

    /// Whether more minutes are committed than the day can hold
    pub fn is_overloaded(&self) -> bool {
        self.used_minutes > self.total_capacity_minutes
    }

    /// Record a pre-existing commitment on this day
    pub(crate) fn add_commitment(&mut self, commitment: CommitmentSummary) {
        self.used_minutes = self.used_minutes.saturating_add(commitment.minutes);
        self.commitments.push(commitment);
    }

    /// Consume minutes for a placement made during the current run
    pub(crate) fn consume(&mut self, minutes: u32) {
        self.used_minutes = self.used_minutes.saturating_add(minutes);
    }
}
