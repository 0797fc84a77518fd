//! Planning properties
//!
//! Invariants that must hold for any input, checked over generated items,
//! capacities and commitments.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashMap;
use studyplan_core::{
    CapacityCalendar, ChainOutcome, CommitmentSummary, DailyHoursRule, DateRange,
    DistributionRequest, PerformanceData, PlanRequest, Planner, PlannerConfig, Storage, StudyItem,
    classify, distribute, split_minutes,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
}

fn range(days: i64) -> DateRange {
    DateRange::new(start(), start() + Duration::days(days - 1)).unwrap()
}

fn items_strategy() -> impl Strategy<Value = Vec<StudyItem>> {
    prop::collection::vec(2u32..=600, 1..25).prop_map(|minutes| {
        minutes
            .into_iter()
            .enumerate()
            .map(|(i, m)| StudyItem::new(format!("item-{i}"), format!("Item {i}"), m))
            .collect()
    })
}

fn commitments_strategy(days: i64) -> impl Strategy<Value = Vec<CommitmentSummary>> {
    prop::collection::vec((0..days, 1u32..300), 0..10).prop_map(|raw| {
        raw.into_iter()
            .map(|(offset, minutes)| CommitmentSummary {
                date: start() + Duration::days(offset),
                minutes,
                title: "Prior".to_string(),
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_split_conserves_minutes(total in 0u32..100_000) {
        let (part1, part2) = split_minutes(total);
        prop_assert_eq!(part1 + part2, total);
        prop_assert!(part1 >= part2);
    }

    #[test]
    fn prop_used_is_sum_of_consumptions(
        capacity_hours in 0.0f64..6.0,
        amounts in prop::collection::vec(0u32..400, 0..20),
    ) {
        let mut calendar =
            CapacityCalendar::build(range(1), &DailyHoursRule::uniform(capacity_hours), &[]).unwrap();
        let mut used_before = 0;
        for amount in &amounts {
            let slot = calendar.consume(start(), *amount).unwrap();
            prop_assert!(slot.used_minutes() >= used_before);
            used_before = slot.used_minutes();
        }

        let slot = calendar.get(start()).unwrap();
        prop_assert_eq!(slot.used_minutes(), amounts.iter().sum::<u32>());
        prop_assert_eq!(
            slot.available_minutes(),
            slot.total_capacity_minutes.saturating_sub(slot.used_minutes())
        );
    }

    #[test]
    fn prop_classify_is_pure(required in 0u64..50_000, available in 0u64..50_000, days in 0usize..60) {
        let first = classify(required, available, days);
        // Unrelated work in between must not matter
        let _ = classify(available, required, days + 1);
        let second = classify(required, available, days);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_commit_never_overbooks(
        items in items_strategy(),
        (days, commitments) in (1i64..21).prop_flat_map(|days| (Just(days), commitments_strategy(days))),
        hours in 0.5f64..5.0,
    ) {
        let request = DistributionRequest {
            items: items.clone(),
            range: range(days),
            hours: DailyHoursRule::uniform(hours),
            commitments,
            allow_over_capacity: false,
        };
        let result = distribute(&request).unwrap();

        prop_assert_eq!(result.over_capacity_placements, 0);
        for session in &result.sessions {
            let slot = result.calendar.get(session.date).unwrap();
            prop_assert!(slot.used_minutes() <= slot.total_capacity_minutes);
        }

        // Each item is either fully placed or listed as skipped
        let mut placed: HashMap<&str, u32> = HashMap::new();
        for session in &result.sessions {
            *placed.entry(session.item_id.as_str()).or_default() += session.duration_minutes;
        }
        for item in &items {
            match placed.get(item.id.as_str()) {
                Some(minutes) => prop_assert_eq!(*minutes, item.estimated_minutes),
                None => prop_assert!(result.skipped.iter().any(|s| s.item_id == item.id)),
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_completion_is_idempotent(rating in 1i32..=4, minutes in 2u32..240) {
        let config = PlannerConfig {
            hours: DailyHoursRule::uniform(6.0),
            ..Default::default()
        };
        let planner = Planner::new(Storage::open_in_memory().unwrap(), config);
        let plan = planner
            .commit_distribution(&PlanRequest::new(vec![StudyItem::new("x", "Topic", minutes)], range(7)), &[])
            .unwrap();
        let part2 = &plan.result.sessions[1];
        let now = Utc.from_utc_datetime(&part2.date.and_hms_opt(18, 0, 0).unwrap());
        let performance = PerformanceData {
            rating: Some(rating),
            ..Default::default()
        };

        let first = planner.complete_session(&part2.id, performance.clone(), now).unwrap();
        let second = planner.complete_session(&part2.id, performance, now).unwrap();

        let next_id = first.next_session().map(|s| s.id.clone());
        prop_assert!(next_id.is_some());
        prop_assert_eq!(second.chain, ChainOutcome::AlreadyCompleted { next_session_id: next_id });
        prop_assert_eq!(planner.store().list_sessions("default", &range(400)).unwrap().len(), 3);
    }
}
