//! Conflict Detector
//!
//! Read-only scan of a calendar for days whose used time exceeds capacity.
//! Works on any calendar state, including one that is still being filled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{CapacityCalendar, DaySlot};

/// An overbooked day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayConflict {
    pub date: NaiveDate,
    /// Minutes committed on the day
    pub required_minutes: u32,
    /// Capacity of the day
    pub available_minutes: u32,
    pub overload_percentage: u32,
}

impl DayConflict {
    fn from_slot(slot: &DaySlot) -> Option<Self> {
        if !slot.is_overloaded() {
            return None;
        }
        let used = slot.used_minutes();
        let capacity = slot.total_capacity_minutes;
        let overload_percentage = if capacity == 0 {
            // Any load on a zero-capacity day counts as fully over
            100
        } else {
            (f64::from(used - capacity) / f64::from(capacity) * 100.0).round() as u32
        };
        Some(Self {
            date: slot.date,
            required_minutes: used,
            available_minutes: capacity,
            overload_percentage,
        })
    }
}

/// All overbooked days, in chronological order
pub fn detect_conflicts(calendar: &CapacityCalendar) -> Vec<DayConflict> {
    calendar
        .slots()
        .iter()
        .filter_map(DayConflict::from_slot)
        .collect()
}
