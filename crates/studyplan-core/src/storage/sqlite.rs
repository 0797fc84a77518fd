//! SQLite Storage Implementation
//!
//! Commitments, plan sessions and per-item memory states in one database.

use chrono::{DateTime, NaiveDate, Utc};
use directories::ProjectDirs;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{CompletionRecord, PlanStore, Result, StorageError};
use crate::fsrs::{FSRSState, LearningState};
use crate::plan::{
    Commitment, CommitmentPatch, CommitmentSummary, DateRange, Flag, PerformanceData, Priority,
    ReviewKind, ScheduledSession, SessionType,
};

const SESSION_COLUMNS: &str = "id, plan_id, item_id, title, date, minutes, session_type, \
     revision_number, topic_ref, subtopic_ref, review_kind, priority, flag, parent_id, next_id, \
     completed, performance";

// ============================================================================
// RECORDS
// ============================================================================

/// Input for an ad-hoc commitment placed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommitment {
    pub date: NaiveDate,
    pub minutes: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtopic_ref: Option<String>,
}

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed [`PlanStore`]
///
/// The connection sits behind a mutex so all methods take `&self` and
/// `Storage` is `Send + Sync`.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -16000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Create new storage instance
    ///
    /// Without a path the database lives in the platform data directory.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "studyplan", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("studyplan.db")
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        Self::configure_connection(&conn)?;
        super::migrations::apply_migrations(&conn)?;

        tracing::debug!(path = %path.display(), "Opened plan database");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Storage backed by a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure_connection(&conn)?;
        super::migrations::apply_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Init("Connection lock poisoned".into()))
    }

    // ========================================================================
    // COMMITMENTS
    // ========================================================================

    /// Record an ad-hoc commitment outside any plan
    pub fn add_commitment(&self, user_id: &str, input: NewCommitment) -> Result<Commitment> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO commitments (
                id, user_id, title, date, minutes, topic_ref, subtopic_ref, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                id,
                user_id,
                input.title,
                input.date,
                input.minutes,
                input.topic_ref,
                input.subtopic_ref,
                now,
            ],
        )?;

        Ok(Commitment {
            id,
            date: input.date,
            minutes: input.minutes,
            title: input.title,
            topic_ref: input.topic_ref,
            subtopic_ref: input.subtopic_ref,
        })
    }

    /// Plan id of a commitment, `None` while it is ad-hoc
    pub fn commitment_plan_id(&self, id: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT plan_id FROM commitments WHERE id = ?1",
            params![id],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?
        .ok_or_else(|| StorageError::NotFound(format!("commitment {}", id)))
    }

    /// Any stored commitment or session by id, discarded ones included
    pub fn get_commitment(&self, id: &str) -> Result<Option<Commitment>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, date, minutes, title, topic_ref, subtopic_ref FROM commitments WHERE id = ?1",
            params![id],
            Self::row_to_commitment,
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn query_commitments(&self, user_id: &str, range: &DateRange) -> Result<Vec<Commitment>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, date, minutes, title, topic_ref, subtopic_ref FROM commitments
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
               AND plan_id IS NULL AND completed = 0 AND discarded = 0
             ORDER BY date, created_at",
        )?;

        let rows = stmt.query_map(params![user_id, range.start, range.end], Self::row_to_commitment)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn row_to_commitment(row: &rusqlite::Row) -> rusqlite::Result<Commitment> {
        Ok(Commitment {
            id: row.get("id")?,
            date: row.get("date")?,
            minutes: row.get("minutes")?,
            title: row.get("title")?,
            topic_ref: row.get("topic_ref")?,
            subtopic_ref: row.get("subtopic_ref")?,
        })
    }

    // ========================================================================
    // SESSIONS
    // ========================================================================

    /// Plan sessions of a user in range, completed ones included
    pub fn list_sessions(&self, user_id: &str, range: &DateRange) -> Result<Vec<ScheduledSession>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM commitments
             WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
               AND session_type IS NOT NULL AND discarded = 0
             ORDER BY date, priority DESC, created_at",
            SESSION_COLUMNS
        ))?;

        let rows = stmt.query_map(params![user_id, range.start, range.end], Self::row_to_session)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<ScheduledSession> {
        let session_type: String = row.get("session_type")?;
        let session_type = SessionType::parse_name(&session_type)
            .ok_or_else(|| invalid_column("session_type", &session_type))?;

        let review_kind = match row.get::<_, Option<String>>("review_kind")? {
            Some(kind) => Some(ReviewKind::parse_name(&kind).ok_or_else(|| invalid_column("review_kind", &kind))?),
            None => None,
        };

        let performance = match row.get::<_, Option<String>>("performance")? {
            Some(json) => Some(serde_json::from_str::<PerformanceData>(&json).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
            })?),
            None => None,
        };

        Ok(ScheduledSession {
            id: row.get("id")?,
            plan_id: row.get("plan_id")?,
            item_id: row.get::<_, Option<String>>("item_id")?.unwrap_or_default(),
            title: row.get("title")?,
            date: row.get("date")?,
            duration_minutes: row.get("minutes")?,
            session_type,
            revision_number: row.get("revision_number")?,
            topic_ref: row.get("topic_ref")?,
            subtopic_ref: row.get("subtopic_ref")?,
            review_kind,
            priority: Priority::from_i32(row.get("priority")?),
            flag: row
                .get::<_, Option<String>>("flag")?
                .and_then(|f| Flag::parse_name(&f)),
            parent_id: row.get("parent_id")?,
            next_id: row.get("next_id")?,
            completed: row.get("completed")?,
            performance,
        })
    }

    // ========================================================================
    // MEMORY STATES
    // ========================================================================

    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    fn row_to_memory_state(row: &rusqlite::Row) -> rusqlite::Result<FSRSState> {
        let last_review: String = row.get("last_review")?;
        let learning_state: String = row.get("learning_state")?;

        Ok(FSRSState {
            stability: row.get("stability")?,
            difficulty: row.get("difficulty")?,
            state: LearningState::parse_name(&learning_state),
            reps: row.get("reps")?,
            lapses: row.get("lapses")?,
            last_review: Self::parse_timestamp(&last_review, "last_review")?,
            scheduled_days: row.get("scheduled_days")?,
        })
    }
}

fn invalid_column(column: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Invalid {} '{}'", column, value),
        )),
    )
}

// ============================================================================
// WRITES
// ============================================================================
//
// Shared by the single-step trait methods and the transactional ones; a
// `Transaction` derefs to `Connection`.

fn insert_sessions(conn: &Connection, user_id: &str, sessions: &[ScheduledSession], now: &str) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO commitments (
            id, user_id, plan_id, item_id, title, date, minutes, session_type,
            revision_number, topic_ref, subtopic_ref, review_kind, priority, flag,
            parent_id, next_id, completed, performance, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?19)",
    )?;
    for session in sessions {
        let performance = session
            .performance
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        stmt.execute(params![
            session.id,
            user_id,
            session.plan_id,
            session.item_id,
            session.title,
            session.date,
            session.duration_minutes,
            session.session_type.as_str(),
            session.revision_number,
            session.topic_ref,
            session.subtopic_ref,
            session.review_kind.map(|k| k.as_str()),
            session.priority.as_i32(),
            session.flag.map(|f| f.as_str()),
            session.parent_id,
            session.next_id,
            session.completed,
            performance,
            now,
        ])?;
    }
    Ok(())
}

fn apply_patch(conn: &Connection, id: &str, patch: &CommitmentPatch, now: &str) -> Result<()> {
    let rows = match patch {
        CommitmentPatch::AttachToPlan { plan_id } => conn.execute(
            "UPDATE commitments SET plan_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![plan_id, now, id],
        )?,
        CommitmentPatch::Discard => conn.execute(
            "UPDATE commitments SET discarded = 1, updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?,
        CommitmentPatch::Complete {
            performance,
            next_session_id,
        } => conn.execute(
            "UPDATE commitments SET
                completed = 1,
                performance = ?1,
                next_id = COALESCE(?2, next_id),
                updated_at = ?3
             WHERE id = ?4",
            params![serde_json::to_string(performance)?, next_session_id, now, id],
        )?,
    };

    if rows == 0 {
        return Err(StorageError::NotFound(format!("commitment {}", id)));
    }
    Ok(())
}

fn upsert_memory_state(conn: &Connection, user_id: &str, item_id: &str, state: &FSRSState, now: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO memory_states (
            user_id, item_id, stability, difficulty, learning_state, reps, lapses,
            last_review, scheduled_days, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user_id,
            item_id,
            state.stability,
            state.difficulty,
            state.state.as_str(),
            state.reps,
            state.lapses,
            state.last_review.to_rfc3339(),
            state.scheduled_days,
            now,
        ],
    )?;
    Ok(())
}

// ============================================================================
// PLAN STORE
// ============================================================================

impl PlanStore for Storage {
    fn fetch_commitments(&self, user_id: &str, range: &DateRange) -> Result<Vec<CommitmentSummary>> {
        Ok(self
            .query_commitments(user_id, range)?
            .iter()
            .map(Commitment::summary)
            .collect())
    }

    fn fetch_detailed_commitments(&self, user_id: &str, range: &DateRange) -> Result<Vec<Commitment>> {
        self.query_commitments(user_id, range)
    }

    fn persist_sessions(&self, user_id: &str, sessions: &[ScheduledSession]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        insert_sessions(&tx, user_id, sessions, &now)?;
        tx.commit()?;

        tracing::debug!(user_id, count = sessions.len(), "Persisted sessions");
        Ok(())
    }

    fn update_commitment(&self, id: &str, patch: &CommitmentPatch) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        apply_patch(&conn, id, patch, &now)
    }

    fn get_session(&self, id: &str) -> Result<Option<ScheduledSession>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM commitments WHERE id = ?1 AND session_type IS NOT NULL",
                SESSION_COLUMNS
            ),
            params![id],
            Self::row_to_session,
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn load_memory_state(&self, user_id: &str, item_id: &str) -> Result<Option<FSRSState>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT * FROM memory_states WHERE user_id = ?1 AND item_id = ?2",
            params![user_id, item_id],
            Self::row_to_memory_state,
        )
        .optional()
        .map_err(StorageError::from)
    }

    fn save_memory_state(&self, user_id: &str, item_id: &str, state: &FSRSState) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.lock()?;
        upsert_memory_state(&conn, user_id, item_id, state, &now)
    }

    fn commit_plan(
        &self,
        user_id: &str,
        sessions: &[ScheduledSession],
        patches: &[(String, CommitmentPatch)],
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        // Dropping the transaction on an early return rolls it back
        let tx = conn.transaction()?;
        insert_sessions(&tx, user_id, sessions, &now)?;
        for (id, patch) in patches {
            apply_patch(&tx, id, patch, &now)?;
        }
        tx.commit()?;

        tracing::debug!(user_id, sessions = sessions.len(), patches = patches.len(), "Committed plan writes");
        Ok(())
    }

    fn record_completion(&self, user_id: &str, record: &CompletionRecord<'_>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if let Some(follow_up) = record.follow_up {
            insert_sessions(&tx, user_id, std::slice::from_ref(follow_up), &now)?;
        }
        if let Some((item_id, state)) = record.memory_state {
            upsert_memory_state(&tx, user_id, item_id, state, &now)?;
        }
        let patch = CommitmentPatch::Complete {
            performance: record.performance.clone(),
            next_session_id: record.follow_up.map(|s| s.id.clone()),
        };
        apply_patch(&tx, record.session_id, &patch, &now)?;
        tx.commit()?;

        tracing::debug!(user_id, session_id = record.session_id, "Recorded completion");
        Ok(())
    }
}
