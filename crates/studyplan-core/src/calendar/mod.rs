//! Capacity Calendar Module
//!
//! Models per-day study capacity minus already-committed work:
//! - One [`DaySlot`] per enumerated day of an inclusive range
//! - Days excluded by the [`DailyHoursRule`] are absent, not zero-capacity
//! - Commitments on absent days are ignored
//!
//! A calendar is owned by exactly one run. Concurrent runs build their own
//! from the same source commitments.

mod allocator;
mod slot;

pub use allocator::{Hold, SlotLookup, SlotRequest};
pub use slot::DaySlot;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plan::{CommitmentSummary, DateRange};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors raised while building or mutating a calendar
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum CalendarError {
    /// Range end precedes its start
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// Day is not part of the calendar
    #[error("Day not in calendar: {0}")]
    UnknownDay(NaiveDate),
    /// Daily hours are negative or not finite
    #[error("Invalid daily hours: {0}")]
    InvalidHours(f64),
}

// ============================================================================
// DAILY HOURS RULE
// ============================================================================

/// Per-weekday / weekend study capacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHoursRule {
    pub weekday_hours: f64,
    pub weekend_hours: f64,
    pub include_weekends: bool,
}

impl Default for DailyHoursRule {
    fn default() -> Self {
        Self {
            weekday_hours: 2.0,
            weekend_hours: 3.0,
            include_weekends: true,
        }
    }
}

impl DailyHoursRule {
    /// Same hours every day of the week
    pub fn uniform(hours: f64) -> Self {
        Self {
            weekday_hours: hours,
            weekend_hours: hours,
            include_weekends: true,
        }
    }

    /// Capacity in minutes for a day, `None` when the day is not studied
    pub fn capacity_for(&self, date: NaiveDate) -> Option<u32> {
        let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        if weekend && !self.include_weekends {
            return None;
        }
        let hours = if weekend { self.weekend_hours } else { self.weekday_hours };
        Some(hours_to_minutes(hours))
    }

    fn validate(&self) -> Result<(), CalendarError> {
        for hours in [self.weekday_hours, self.weekend_hours] {
            if !hours.is_finite() || hours < 0.0 {
                return Err(CalendarError::InvalidHours(hours));
            }
        }
        Ok(())
    }
}

fn hours_to_minutes(hours: f64) -> u32 {
    (hours * 60.0).round().clamp(0.0, u32::MAX as f64) as u32
}

// ============================================================================
// CAPACITY CALENDAR
// ============================================================================

/// Ordered set of day slots for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCalendar {
    slots: Vec<DaySlot>,
}

impl CapacityCalendar {
    /// Enumerate the studied days of `range` and pre-load commitments
    pub fn build(
        range: DateRange,
        rule: &DailyHoursRule,
        commitments: &[CommitmentSummary],
    ) -> Result<Self, CalendarError> {
        if range.start > range.end {
            return Err(CalendarError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        rule.validate()?;

        let mut calendar = Self {
            slots: range
                .days()
                .filter_map(|date| rule.capacity_for(date).map(|cap| DaySlot::new(date, cap)))
                .collect(),
        };

        for commitment in commitments {
            match calendar.index_of(commitment.date) {
                Some(idx) => calendar.slots[idx].add_commitment(commitment.clone()),
                None => tracing::debug!(
                    date = %commitment.date,
                    minutes = commitment.minutes,
                    "Ignoring commitment outside studied days"
                ),
            }
        }

        Ok(calendar)
    }

    /// Build directly from slots (chronological order expected)
    pub fn from_slots(mut slots: Vec<DaySlot>) -> Self {
        slots.sort_by_key(|s| s.date);
        Self { slots }
    }

    pub fn slots(&self) -> &[DaySlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Slot for a day, if the day is enumerated
    pub fn get(&self, date: NaiveDate) -> Option<&DaySlot> {
        self.index_of(date).map(|idx| &self.slots[idx])
    }

    fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.slots.binary_search_by_key(&date, |s| s.date).ok()
    }

    /// Sum of capacity over all enumerated days
    pub fn total_capacity_minutes(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.total_capacity_minutes)).sum()
    }

    /// Sum of remaining (clamped) availability over all enumerated days
    pub fn total_available_minutes(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.available_minutes())).sum()
    }

    /// Sum of used minutes over all enumerated days
    pub fn total_used_minutes(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.used_minutes())).sum()
    }

    /// Mark minutes as consumed on a day
    ///
    /// Usage only ever grows; there is no way to release minutes within a run.
    pub fn consume(&mut self, date: NaiveDate, minutes: u32) -> Result<&DaySlot, CalendarError> {
        let idx = self.index_of(date).ok_or(CalendarError::UnknownDay(date))?;
        let slot = &mut self.slots[idx];
        slot.consume(minutes);
        Ok(slot)
    }
}
