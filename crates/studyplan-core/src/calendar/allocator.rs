//! Slot Allocator
//!
//! Finds a day with enough remaining capacity for a requested duration.
//! Lookup and consumption are separate steps so a caller can inspect a day
//! before committing to it.
//!
//! Search order:
//! 1. The preferred day, when it has room
//! 2. The first chronological day with room
//! 3. With `allow_over_capacity`, the day with the most room left (first on ties)
//! 4. Otherwise no slot
//!
//! Steps 2 and 3 only consider days on or after `earliest_date` when it is set.

use chrono::NaiveDate;

use super::CapacityCalendar;

/// A lookup for room on the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    pub required_minutes: u32,
    pub preferred_date: Option<NaiveDate>,
    /// Days before this one are never returned
    pub earliest_date: Option<NaiveDate>,
    /// Fall back to the most-available day even when it is too small.
    /// Preview runs only; never set on a committing run.
    pub allow_over_capacity: bool,
}

impl SlotRequest {
    pub fn new(required_minutes: u32) -> Self {
        Self {
            required_minutes,
            preferred_date: None,
            earliest_date: None,
            allow_over_capacity: false,
        }
    }

    pub fn preferring(mut self, date: Option<NaiveDate>) -> Self {
        self.preferred_date = date;
        self
    }

    pub fn not_before(mut self, date: NaiveDate) -> Self {
        self.earliest_date = Some(date);
        self
    }

    pub fn over_capacity(mut self, allow: bool) -> Self {
        self.allow_over_capacity = allow;
        self
    }
}

/// Minutes already promised on a day but not yet consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hold {
    pub date: NaiveDate,
    pub minutes: u32,
}

/// Outcome of a slot lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLookup {
    /// A day with enough room
    Found(NaiveDate),
    /// No day had enough room; this is the day with the most room left
    OverCapacity(NaiveDate),
    /// The calendar has days but none can take the request
    NoSlot,
    /// The calendar has no days at all
    EmptyCalendar,
}

impl SlotLookup {
    /// Day to place on, if any
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            SlotLookup::Found(d) | SlotLookup::OverCapacity(d) => Some(*d),
            SlotLookup::NoSlot | SlotLookup::EmptyCalendar => None,
        }
    }

    pub fn is_over_capacity(&self) -> bool {
        matches!(self, SlotLookup::OverCapacity(_))
    }
}

impl CapacityCalendar {
    /// Find a day for `request` on the current calendar state
    pub fn find_slot(&self, request: &SlotRequest) -> SlotLookup {
        self.find_slot_with_hold(request, None)
    }

    /// Find a day for `request`, treating `hold` as already consumed
    ///
    /// The calendar itself is not modified.
    pub fn find_slot_with_hold(&self, request: &SlotRequest, hold: Option<Hold>) -> SlotLookup {
        if self.slots.is_empty() {
            return SlotLookup::EmptyCalendar;
        }

        let available = |date: NaiveDate, free: u32| -> u32 {
            match hold {
                Some(h) if h.date == date => free.saturating_sub(h.minutes),
                _ => free,
            }
        };

        if let Some(preferred) = request.preferred_date {
            if let Some(slot) = self.get(preferred) {
                if available(slot.date, slot.available_minutes()) >= request.required_minutes {
                    return SlotLookup::Found(preferred);
                }
            }
        }

        let candidates: Vec<_> = self
            .slots
            .iter()
            .filter(|s| request.earliest_date.is_none_or(|earliest| s.date >= earliest))
            .collect();

        if let Some(slot) = candidates
            .iter()
            .find(|s| available(s.date, s.available_minutes()) >= request.required_minutes)
        {
            return SlotLookup::Found(slot.date);
        }

        if !request.allow_over_capacity {
            return SlotLookup::NoSlot;
        }

        // Strictly greater keeps the earliest day on ties
        let mut best: Option<(NaiveDate, u32)> = None;
        for slot in candidates {
            let free = available(slot.date, slot.available_minutes());
            if best.is_none_or(|(_, best_free)| free > best_free) {
                best = Some((slot.date, free));
            }
        }
        match best {
            Some((date, _)) => SlotLookup::OverCapacity(date),
            None => SlotLookup::NoSlot,
        }
    }
}
