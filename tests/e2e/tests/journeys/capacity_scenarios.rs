//! Journey: capacity edge cases from a learner's point of view
//!
//! Single-day plans, comfortable and overloaded periods, weekend policy
//! and a forgotten revision.

use chrono::{Datelike, Weekday};
use studyplan_core::{
    ChainOutcome, DailyHoursRule, PerformanceData, PlanRequest, PlannerError, Priority, ReviewKind,
    Scenario, SessionType, StudyItem,
};
use studyplan_e2e_tests::{PerformanceProfile, TestDataFactory, TestDatabaseManager};

/// Daily rule yielding exactly `minutes` every day
fn minutes_per_day(minutes: u32) -> DailyHoursRule {
    DailyHoursRule::uniform(f64::from(minutes) / 60.0)
}

#[test]
fn test_single_day_exactly_full() {
    let db = TestDatabaseManager::new_temp_with_hours(minutes_per_day(300));
    let range = TestDataFactory::days_from(TestDataFactory::monday(), 1);

    let plan = db
        .planner
        .commit_distribution(&PlanRequest::new(vec![StudyItem::new("thermo", "Thermodynamics", 300)], range), &[])
        .unwrap();

    assert_eq!(plan.result.scenario(), Scenario::Tight);
    assert!(plan.result.skipped.is_empty());
    let minutes: Vec<u32> = plan.result.sessions.iter().map(|s| s.duration_minutes).collect();
    assert_eq!(minutes, vec![180, 120]);
    // No next day, so part 2 shares the day with part 1
    assert!(plan.result.sessions.iter().all(|s| s.date == range.start));
    assert!(plan.result.conflicts.is_empty());
}

#[test]
fn test_part_two_prefers_following_day() {
    let db = TestDatabaseManager::new_temp_with_hours(minutes_per_day(300));
    let range = TestDataFactory::days_from(TestDataFactory::monday(), 2);

    let plan = db
        .planner
        .commit_distribution(&PlanRequest::new(vec![StudyItem::new("thermo", "Thermodynamics", 300)], range), &[])
        .unwrap();

    let [part1, part2] = plan.result.sessions.as_slice() else {
        panic!("expected two sessions");
    };
    assert_eq!(part1.date, range.start);
    assert_eq!(part2.date, range.end);
}

#[test]
fn test_normal_period_utilization() {
    let db = TestDatabaseManager::new_temp_with_hours(minutes_per_day(500));
    let range = TestDataFactory::days_from(TestDataFactory::monday(), 3);
    let request = PlanRequest::new(
        vec![
            StudyItem::new("big", "Organic chemistry", 600),
            StudyItem::new("small", "Unit conversions", 100),
        ],
        range,
    );

    let preview = db.planner.preview_distribution(&request).unwrap();
    assert_eq!(preview.total_required_minutes, 700);
    assert_eq!(preview.total_available_minutes, 1500);
    assert_eq!(preview.utilization_percentage, 47);
    assert_eq!(preview.scenario(), Scenario::Normal);
    assert_eq!(preview.over_capacity_placements, 0);

    let plan = db.planner.commit_distribution(&request, &[]).unwrap();
    assert_eq!(plan.result.placed_items(), 2);
    assert_eq!(db.session_count(&range), 4);
}

#[test]
fn test_overloaded_period() {
    let db = TestDatabaseManager::new_temp_with_hours(minutes_per_day(500));
    let range = TestDataFactory::days_from(TestDataFactory::monday(), 1);
    let request = PlanRequest::new(
        vec![
            StudyItem::new("a", "Electromagnetism", 600),
            StudyItem::new("b", "Statistics", 400),
        ],
        range,
    );

    // Preview still places everything and shows the overload
    let preview = db.planner.preview_distribution(&request).unwrap();
    assert_eq!(preview.scenario(), Scenario::Impossible);
    assert_eq!(preview.feasibility.shortfall_minutes, Some(500));
    assert!(!preview.warnings().is_empty());
    assert!(!preview.feasibility.suggestions.is_empty());
    assert_eq!(preview.sessions.len(), 4);
    assert_eq!(preview.conflicts.len(), 1);
    assert_eq!(preview.conflicts[0].required_minutes, 1000);
    assert_eq!(preview.conflicts[0].overload_percentage, 100);

    let err = db.planner.commit_distribution(&request, &[]).unwrap_err();
    assert!(matches!(err, PlannerError::Infeasible { ref report } if report.scenario == Scenario::Impossible));
    assert_eq!(db.session_count(&range), 0);
}

#[test]
fn test_existing_load_counts_against_capacity() {
    let db = TestDatabaseManager::new_temp();
    let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 1);
    db.seed_daily_load(&range, 90);

    // 7 days x 30 free minutes
    let preview = db
        .planner
        .preview_distribution(&PlanRequest::new(vec![StudyItem::new("x", "Vectors", 200)], range))
        .unwrap();
    assert_eq!(preview.total_available_minutes, 210);
    assert_eq!(preview.scenario(), Scenario::Tight);
}

#[test]
fn test_weekends_skipped_when_disabled() {
    let hours = DailyHoursRule {
        weekday_hours: 1.0,
        weekend_hours: 8.0,
        include_weekends: false,
    };
    let db = TestDatabaseManager::new_temp_with_hours(hours);
    let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 2);
    // A weekend commitment is invisible to a weekday-only calendar
    db.seed_commitment(TestDataFactory::monday() + chrono::Duration::days(5), 120, "Sports", None, None);

    let plan = db
        .planner
        .commit_distribution(&PlanRequest::new(TestDataFactory::syllabus(), range), &[])
        .unwrap();

    assert_eq!(plan.result.total_available_minutes, 600);
    // 72 minutes of genetics part 1 never fits an hour-long weekday
    assert_eq!(plan.result.skipped.len(), 1);
    assert_eq!(plan.result.skipped[0].item_id, "genetics");
    assert!(
        plan.result
            .sessions
            .iter()
            .all(|s| !matches!(s.date.weekday(), Weekday::Sat | Weekday::Sun))
    );
}

#[test]
fn test_forgotten_revision_is_escalated() {
    let db = TestDatabaseManager::new_temp();
    let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 1);
    let plan = db
        .planner
        .commit_distribution(&PlanRequest::new(vec![StudyItem::new("ions", "Ionic bonding", 50)], range), &[])
        .unwrap();
    let part2 = plan
        .result
        .sessions
        .iter()
        .find(|s| s.session_type == SessionType::InitialPart2)
        .unwrap();

    let revision1 = db
        .planner
        .complete_session(&part2.id, PerformanceProfile::Perfect.data(), TestDataFactory::evening(part2.date))
        .unwrap()
        .next_session()
        .cloned()
        .unwrap();

    let again = PerformanceData {
        rating: Some(1),
        ..Default::default()
    };
    let outcome = db
        .planner
        .complete_session(&revision1.id, again, TestDataFactory::evening(revision1.date))
        .unwrap();
    let ChainOutcome::Scheduled(follow) = outcome.chain else {
        panic!("expected a follow-up revision");
    };

    assert_eq!(follow.session.review_kind, Some(ReviewKind::ReadingQuestions));
    assert_eq!(follow.session.duration_minutes, 45);
    assert_eq!(follow.session.priority, Priority::Highest);
    assert!(follow.session.title.starts_with("[CRITICAL]"));
}
