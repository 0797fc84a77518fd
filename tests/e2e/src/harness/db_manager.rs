//! Test Database Manager
//!
//! Provides isolated planners for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded ad-hoc commitments
//! - Reopening a database to check what actually persisted

use chrono::NaiveDate;
use std::path::PathBuf;
use studyplan_core::{
    Commitment, DailyHoursRule, DateRange, NewCommitment, Planner, PlannerConfig, ScheduledSession,
    Storage,
};
use tempfile::TempDir;

/// User every test database plans for
pub const TEST_USER: &str = "e2e-student";

/// Manager for test databases
///
/// Creates an isolated database and planner for each test to prevent
/// interference. Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
///
/// let preview = db.planner.preview_distribution(&request)?;
///
/// // Database is automatically deleted when `db` goes out of scope
/// ```
pub struct TestDatabaseManager {
    /// Planner over the test database
    pub planner: Planner<Storage>,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
    config: PlannerConfig,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    ///
    /// Capacity defaults to two hours every day, weekends included.
    pub fn new_temp() -> Self {
        Self::new_temp_with_hours(DailyHoursRule::uniform(2.0))
    }

    /// Create a new test database with a specific daily capacity rule
    pub fn new_temp_with_hours(hours: DailyHoursRule) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_studyplan.db");
        let config = PlannerConfig {
            user_id: TEST_USER.to_string(),
            hours,
            ..Default::default()
        };

        let storage = Storage::new(Some(db_path.clone())).expect("Failed to create test storage");

        Self {
            planner: Planner::new(storage, config.clone()),
            _temp_dir: Some(temp_dir),
            db_path,
            config,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    pub fn storage(&self) -> &Storage {
        self.planner.store()
    }

    /// Sessions stored for the test user in `range`
    pub fn sessions(&self, range: &DateRange) -> Vec<ScheduledSession> {
        self.storage()
            .list_sessions(TEST_USER, range)
            .expect("Failed to list sessions")
    }

    /// Number of sessions stored in `range`
    pub fn session_count(&self, range: &DateRange) -> usize {
        self.sessions(range).len()
    }

    /// Every session of the test user, whatever its date
    pub fn all_sessions(&self) -> Vec<ScheduledSession> {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid date"),
            NaiveDate::from_ymd_opt(2100, 12, 31).expect("valid date"),
        )
        .expect("valid range");
        self.sessions(&range)
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Seed one ad-hoc commitment
    pub fn seed_commitment(
        &self,
        date: NaiveDate,
        minutes: u32,
        title: &str,
        topic: Option<&str>,
        subtopic: Option<&str>,
    ) -> Commitment {
        self.storage()
            .add_commitment(
                TEST_USER,
                NewCommitment {
                    date,
                    minutes,
                    title: title.to_string(),
                    topic_ref: topic.map(String::from),
                    subtopic_ref: subtopic.map(String::from),
                },
            )
            .expect("Failed to seed commitment")
    }

    /// Seed a topic-less commitment of `minutes` on every day of `range`
    pub fn seed_daily_load(&self, range: &DateRange, minutes: u32) -> Vec<Commitment> {
        range
            .days()
            .map(|date| self.seed_commitment(date, minutes, "Coursework", None, None))
            .collect()
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Drop the planner and open the same database again
    pub fn reopen(&mut self) {
        let storage = Storage::new(Some(self.db_path.clone())).expect("Failed to reopen storage");
        self.planner = Planner::new(storage, self.config.clone());
    }

    /// Delete the database and start from an empty one
    pub fn recreate(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
        let storage = Storage::new(Some(self.db_path.clone())).expect("Failed to recreate storage");
        self.planner = Planner::new(storage, self.config.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyplan_core::PlanStore;

    fn week() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_temp_database_creation() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.path().exists());
        assert_eq!(db.session_count(&week()), 0);
        assert_eq!(db.planner.config().user_id, TEST_USER);
    }

    #[test]
    fn test_seed_daily_load() {
        let db = TestDatabaseManager::new_temp();
        let seeded = db.seed_daily_load(&week(), 30);
        assert_eq!(seeded.len(), 7);
        assert_eq!(db.storage().fetch_commitments(TEST_USER, &week()).unwrap().len(), 7);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let mut db = TestDatabaseManager::new_temp();
        let seeded = db.seed_commitment(week().start, 45, "Essay", Some("history"), None);
        db.reopen();
        assert_eq!(db.storage().get_commitment(&seeded.id).unwrap(), Some(seeded));
    }

    #[test]
    fn test_recreate_clears_data() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_daily_load(&week(), 30);
        db.recreate();
        assert!(db.storage().fetch_commitments(TEST_USER, &week()).unwrap().is_empty());
    }
}
