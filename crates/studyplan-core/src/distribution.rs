//! Distribution Algorithm
//!
//! Places study items into a bounded calendar under daily capacity limits.
//!
//! ## How It Works
//!
//! 1. Build the capacity calendar, pre-loaded with existing commitments
//! 2. Sort items largest-first (stable on ties)
//! 3. Split each item 60/40 into two initial sessions
//! 4. Place part 1 anywhere; place part 2 preferring the following day and
//!    never before part 1
//! 5. Consume both placements before looking at the next item
//!
//! Largest-first is a greedy heuristic chosen to reduce fragmentation. It is
//! not an optimal packing and earlier placements are never revisited.
//!
//! An item is placed whole or not at all. Items that do not fit are reported
//! as [`PlacementFailure`]s and the run carries on.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calendar::{CalendarError, CapacityCalendar, DailyHoursRule, Hold, SlotLookup, SlotRequest};
use crate::conflicts::{DayConflict, detect_conflicts};
use crate::feasibility::{FeasibilityReport, Scenario, classify};
use crate::plan::{CommitmentSummary, DateRange, ScheduledSession, SessionType, StudyItem};

/// Share of an item's time given to its first initial session
pub const PART_ONE_SHARE: f64 = 0.6;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Errors that prevent a run from starting
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
    /// Item with no study time
    #[error("Invalid item {0}: estimated minutes must be greater than zero")]
    InvalidItem(String),
    /// Calendar could not be built or updated
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),
}

// ============================================================================
// REQUEST / RESULT
// ============================================================================

/// Input of one distribution run
#[derive(Debug, Clone)]
pub struct DistributionRequest {
    pub items: Vec<StudyItem>,
    pub range: DateRange,
    pub hours: DailyHoursRule,
    pub commitments: Vec<CommitmentSummary>,
    /// Force every item onto some day so overloads surface (preview only)
    pub allow_over_capacity: bool,
}

/// Which half of an item could not be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailedPart {
    Part1,
    Part2,
}

/// An item skipped because no day could take it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementFailure {
    pub item_id: String,
    pub title: String,
    pub required_minutes: u32,
    pub failed_part: FailedPart,
    pub reason: String,
}

/// Everything a run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResult {
    pub sessions: Vec<ScheduledSession>,
    pub skipped: Vec<PlacementFailure>,
    pub feasibility: FeasibilityReport,
    pub conflicts: Vec<DayConflict>,
    pub total_required_minutes: u64,
    pub total_available_minutes: u64,
    pub utilization_percentage: u32,
    /// Sessions placed on a day that lacked room (preview runs only)
    pub over_capacity_placements: usize,
    /// Final state of the run's calendar
    pub calendar: CapacityCalendar,
}

impl DistributionResult {
    pub fn scenario(&self) -> Scenario {
        self.feasibility.scenario
    }

    /// Classifier warnings followed by one line per skipped item
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = self.feasibility.warnings.clone();
        warnings.extend(
            self.skipped
                .iter()
                .map(|f| format!("Could not schedule \"{}\": {}", f.title, f.reason)),
        );
        warnings
    }

    /// Number of items that received both initial sessions
    pub fn placed_items(&self) -> usize {
        self.sessions.len() / 2
    }
}

// ============================================================================
// ALGORITHM
// ============================================================================

/// Split an item's minutes 60/40; the parts always sum to the total
///
/// A 1-minute item splits into (1, 0). Its part 2 is still emitted so every
/// placed item has both initial sessions, and it consumes no capacity.
pub fn split_minutes(total: u32) -> (u32, u32) {
    let part1 = (f64::from(total) * PART_ONE_SHARE).round() as u32;
    let part1 = part1.min(total);
    (part1, total - part1)
}

/// Run the distribution algorithm
pub fn distribute(request: &DistributionRequest) -> Result<DistributionResult, DistributionError> {
    if let Some(bad) = request.items.iter().find(|i| i.estimated_minutes == 0) {
        return Err(DistributionError::InvalidItem(bad.id.clone()));
    }

    let mut calendar = CapacityCalendar::build(request.range, &request.hours, &request.commitments)?;

    let total_required: u64 = request
        .items
        .iter()
        .map(|i| u64::from(i.estimated_minutes))
        .sum();
    let total_available = calendar.total_available_minutes();
    let feasibility = classify(total_required, total_available, calendar.len());

    let mut ordered: Vec<&StudyItem> = request.items.iter().collect();
    ordered.sort_by(|a, b| b.estimated_minutes.cmp(&a.estimated_minutes));

    let mut sessions = Vec::with_capacity(ordered.len() * 2);
    let mut skipped = Vec::new();
    let mut over_capacity_placements = 0;

    for item in ordered {
        match place_item(&mut calendar, item, request.allow_over_capacity)? {
            Placement::Placed { first, second, over_capacity } => {
                over_capacity_placements += over_capacity;
                sessions.push(first);
                sessions.push(second);
            }
            Placement::Skipped(failure) => {
                warn!(
                    item_id = %failure.item_id,
                    minutes = failure.required_minutes,
                    part = ?failure.failed_part,
                    "Skipping item: {}",
                    failure.reason
                );
                skipped.push(failure);
            }
        }
    }

    let conflicts = detect_conflicts(&calendar);

    info!(
        range = %request.range,
        placed = sessions.len() / 2,
        skipped = skipped.len(),
        conflicts = conflicts.len(),
        scenario = %feasibility.scenario,
        "Distribution run complete"
    );

    Ok(DistributionResult {
        sessions,
        skipped,
        utilization_percentage: feasibility.utilization_percentage,
        feasibility,
        conflicts,
        total_required_minutes: total_required,
        total_available_minutes: total_available,
        over_capacity_placements,
        calendar,
    })
}

enum Placement {
    Placed {
        first: ScheduledSession,
        second: ScheduledSession,
        over_capacity: usize,
    },
    Skipped(PlacementFailure),
}

fn place_item(
    calendar: &mut CapacityCalendar,
    item: &StudyItem,
    allow_over_capacity: bool,
) -> Result<Placement, CalendarError> {
    let (part1, part2) = split_minutes(item.estimated_minutes);

    let first_lookup = calendar.find_slot(&SlotRequest::new(part1).over_capacity(allow_over_capacity));
    let Some(first_day) = first_lookup.date() else {
        return Ok(Placement::Skipped(failure(item, FailedPart::Part1, part1, first_lookup)));
    };

    // Part 2 is looked up as if part 1 were already consumed, so nothing is
    // consumed for an item that ends up skipped.
    let second_request = SlotRequest::new(part2)
        .preferring(first_day.succ_opt())
        .not_before(first_day)
        .over_capacity(allow_over_capacity);
    let hold = Hold { date: first_day, minutes: part1 };
    let second_lookup = calendar.find_slot_with_hold(&second_request, Some(hold));
    let Some(second_day) = second_lookup.date() else {
        return Ok(Placement::Skipped(failure(item, FailedPart::Part2, part2, second_lookup)));
    };

    calendar.consume(first_day, part1)?;
    calendar.consume(second_day, part2)?;

    debug!(
        item_id = %item.id,
        part1_day = %first_day,
        part2_day = %second_day,
        part1,
        part2,
        "Placed item"
    );

    let mut first = ScheduledSession::initial(item, SessionType::InitialPart1, first_day, part1);
    let mut second = ScheduledSession::initial(item, SessionType::InitialPart2, second_day, part2);
    first.next_id = Some(second.id.clone());
    second.parent_id = Some(first.id.clone());

    let over_capacity = usize::from(first_lookup.is_over_capacity()) + usize::from(second_lookup.is_over_capacity());
    Ok(Placement::Placed { first, second, over_capacity })
}

fn failure(item: &StudyItem, part: FailedPart, minutes: u32, lookup: SlotLookup) -> PlacementFailure {
    let reason = match lookup {
        SlotLookup::EmptyCalendar => "no study days in the selected period".to_string(),
        _ => format!("no day has {} minutes free", minutes),
    };
    PlacementFailure {
        item_id: item.id.clone(),
        title: item.title.clone(),
        required_minutes: item.estimated_minutes,
        failed_part: part,
        reason,
    }
}
