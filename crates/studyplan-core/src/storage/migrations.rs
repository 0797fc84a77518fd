//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: commitments, sessions, memory states",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Revision chain links and review metadata",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
///
/// Ad-hoc commitments and plan sessions share one table; a row with no
/// `session_type` is an ad-hoc commitment, a row with no `plan_id` is not
/// part of any plan.
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS commitments (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    plan_id TEXT,
    item_id TEXT,
    title TEXT NOT NULL,
    date TEXT NOT NULL,
    minutes INTEGER NOT NULL,
    session_type TEXT,
    revision_number INTEGER NOT NULL DEFAULT 0,
    topic_ref TEXT,
    subtopic_ref TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    discarded INTEGER NOT NULL DEFAULT 0,
    performance TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_commitments_user_date ON commitments(user_id, date);
CREATE INDEX IF NOT EXISTS idx_commitments_plan ON commitments(plan_id);
CREATE INDEX IF NOT EXISTS idx_commitments_item ON commitments(item_id);

-- FSRS memory state, one row per (user, study item)
CREATE TABLE IF NOT EXISTS memory_states (
    user_id TEXT NOT NULL,
    item_id TEXT NOT NULL,
    stability REAL NOT NULL,
    difficulty REAL NOT NULL,
    learning_state TEXT NOT NULL DEFAULT 'new',
    reps INTEGER NOT NULL DEFAULT 0,
    lapses INTEGER NOT NULL DEFAULT 0,
    last_review TEXT NOT NULL,
    scheduled_days INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (user_id, item_id)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Revision chain links and review metadata
const MIGRATION_V2_UP: &str = r#"
ALTER TABLE commitments ADD COLUMN parent_id TEXT;
ALTER TABLE commitments ADD COLUMN next_id TEXT;
ALTER TABLE commitments ADD COLUMN review_kind TEXT;
ALTER TABLE commitments ADD COLUMN priority INTEGER NOT NULL DEFAULT 1;
ALTER TABLE commitments ADD COLUMN flag TEXT;

CREATE INDEX IF NOT EXISTS idx_commitments_parent ON commitments(parent_id);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
