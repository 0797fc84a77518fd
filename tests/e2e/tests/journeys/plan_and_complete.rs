//! Journey: plan a syllabus, then study through a revision chain
//!
//! Preview → commit → complete part 1 → complete part 2 → revisions,
//! with the database reopened in between to make sure everything persisted.

use serde::Deserialize;
use studyplan_core::{
    ChainOutcome, Flag, PlanRequest, PlanStore, Priority, Rating, ReviewKind, Scenario, SessionType,
};
use studyplan_e2e_tests::harness::TEST_USER;
use studyplan_e2e_tests::{PerformanceProfile, TestDataFactory, TestDatabaseManager};

#[test]
fn test_preview_then_commit_syllabus() {
    let db = TestDatabaseManager::new_temp();
    let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 1);
    let request = PlanRequest::new(TestDataFactory::syllabus(), range);

    let preview = db.planner.preview_distribution(&request).unwrap();
    assert_eq!(preview.sessions.len(), 8);
    assert!(preview.skipped.is_empty());
    assert_eq!(db.session_count(&range), 0, "preview must not write");

    let plan = db.planner.commit_distribution(&request, &[]).unwrap();
    // 345 of 840 minutes
    assert_eq!(plan.result.scenario(), Scenario::Normal);

    let stored = db.sessions(&range);
    assert_eq!(stored.len(), 8);
    for part1 in stored.iter().filter(|s| s.session_type == SessionType::InitialPart1) {
        let part2 = stored
            .iter()
            .find(|s| Some(&s.id) == part1.next_id.as_ref())
            .expect("part 2 is linked from part 1");
        assert_eq!(part2.parent_id.as_deref(), Some(part1.id.as_str()));
        assert!(part2.date >= part1.date);
        assert_eq!(part1.item_id, part2.item_id);
        assert_eq!(part1.plan_id.as_deref(), Some(plan.plan_id.as_str()));
        assert!(part1.title.ends_with("(Part 1)"));
    }
}

/// The fields a client reads from a previewed plan
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewView {
    total_required_minutes: u64,
    utilization_percentage: u32,
    sessions: Vec<SessionView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    session_type: String,
    duration_minutes: u32,
    next_id: Option<String>,
}

#[test]
fn test_preview_json_shape() {
    let db = TestDatabaseManager::new_temp();
    let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 1);
    let preview = db
        .planner
        .preview_distribution(&PlanRequest::new(TestDataFactory::syllabus(), range))
        .unwrap();

    let json = serde_json::to_value(&preview).unwrap();
    assert_eq!(json["feasibility"]["scenario"], "normal");
    assert!(json["sessions"][0].get("planId").is_none(), "preview sessions belong to no plan");

    let view: PreviewView = serde_json::from_value(json).unwrap();
    assert_eq!(view.total_required_minutes, 345);
    assert_eq!(view.utilization_percentage, preview.utilization_percentage);
    assert_eq!(view.sessions.len(), 8);
    // Same names as stored sessions
    assert_eq!(view.sessions[0].session_type, SessionType::InitialPart1.as_str());
    assert_eq!(view.sessions[1].session_type, SessionType::InitialPart2.as_str());
    assert!(view.sessions[0].next_id.is_some());
    assert_eq!(
        view.sessions.iter().map(|s| u64::from(s.duration_minutes)).sum::<u64>(),
        view.total_required_minutes
    );
}

#[test]
fn test_full_revision_chain() {
    let mut db = TestDatabaseManager::new_temp();
    let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 1);
    let item = TestDataFactory::topic_item("kinematics", "Kinematics", 90, "physics", Some("mechanics"));
    let plan = db
        .planner
        .commit_distribution(&PlanRequest::new(vec![item], range), &[])
        .unwrap();
    let part1 = plan.result.sessions[0].clone();
    let part2 = plan.result.sessions[1].clone();
    assert_eq!((part1.duration_minutes, part2.duration_minutes), (54, 36));

    // Part 1 done: part 2 already exists
    let outcome = db
        .planner
        .complete_session(&part1.id, PerformanceProfile::Steady.data(), TestDataFactory::evening(part1.date))
        .unwrap();
    assert!(matches!(&outcome.chain, ChainOutcome::Existing(next) if next.id == part2.id));

    db.reopen();

    // Part 2 done: first revision from the combined scores
    let outcome = db
        .planner
        .complete_session(&part2.id, PerformanceProfile::Steady.data(), TestDataFactory::evening(part2.date))
        .unwrap();
    let ChainOutcome::Scheduled(follow) = &outcome.chain else {
        panic!("expected a new revision, got {:?}", outcome.chain);
    };
    assert_eq!(follow.rating, Some(Rating::Good));
    let revision1 = follow.session.clone();
    assert_eq!(revision1.revision_number, 1);
    assert_eq!(revision1.review_kind, Some(ReviewKind::FlashcardsOnly));
    assert_eq!(revision1.duration_minutes, 10);
    assert_eq!(revision1.title, "Kinematics - Revision 1");
    assert_eq!(revision1.topic_ref.as_deref(), Some("physics"));
    assert!(revision1.date > part2.date);

    // Revision 1 shaky: reinforced reading
    let outcome = db
        .planner
        .complete_session(&revision1.id, PerformanceProfile::Shaky.data(), TestDataFactory::evening(revision1.date))
        .unwrap();
    let revision2 = outcome.next_session().unwrap().clone();
    assert_eq!(revision2.revision_number, 2);
    assert_eq!(revision2.review_kind, Some(ReviewKind::ReadingFlashcards));
    assert_eq!(revision2.priority, Priority::Elevated);
    assert_eq!(revision2.flag, Some(Flag::Reinforce));
    assert!(revision2.title.starts_with("[REINFORCE]"));

    // Revision 2 forgotten: critical reading with questions
    let outcome = db
        .planner
        .complete_session(&revision2.id, PerformanceProfile::Forgotten.data(), TestDataFactory::evening(revision2.date))
        .unwrap();
    let revision3 = outcome.next_session().unwrap().clone();
    assert_eq!(revision3.revision_number, 3);
    assert_eq!(revision3.review_kind, Some(ReviewKind::ReadingQuestions));
    assert_eq!(revision3.duration_minutes, 45);
    assert_eq!(revision3.priority, Priority::Highest);
    assert_eq!(revision3.flag, Some(Flag::Critical));
    assert_eq!(revision3.title, "[CRITICAL] Kinematics - Revision 3");

    let state = db
        .storage()
        .load_memory_state(TEST_USER, "kinematics")
        .unwrap()
        .expect("memory state stored after each revision");
    assert_eq!(state.reps, 3);
    assert_eq!(state.lapses, 1);

    // Every stored session links back to its predecessor
    let all = db.all_sessions();
    assert_eq!(all.len(), 5);
    for session in all.iter().filter(|s| s.id != part1.id) {
        let parent = session.parent_id.as_ref().expect("non-root sessions have a parent");
        assert!(all.iter().any(|s| &s.id == parent));
    }
}

#[test]
fn test_completing_twice_does_not_fork_chain() {
    let mut db = TestDatabaseManager::new_temp();
    let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 1);
    let plan = db
        .planner
        .commit_distribution(&PlanRequest::new(vec![TestDataFactory::item("optics", "Optics", 60)], range), &[])
        .unwrap();
    let part2 = &plan.result.sessions[1];
    let when = TestDataFactory::evening(part2.date);

    let first = db
        .planner
        .complete_session(&part2.id, PerformanceProfile::Perfect.data(), when)
        .unwrap();
    let next_id = first.next_session().unwrap().id.clone();

    db.reopen();
    let second = db
        .planner
        .complete_session(&part2.id, PerformanceProfile::Perfect.data(), when)
        .unwrap();
    assert_eq!(
        second.chain,
        ChainOutcome::AlreadyCompleted {
            next_session_id: Some(next_id)
        }
    );
    assert_eq!(db.all_sessions().len(), 3);
}
