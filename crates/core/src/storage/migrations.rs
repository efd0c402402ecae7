//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Scheduled sessions (mirrored from course scheduling)
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                grace_minutes INTEGER,
                CHECK (end_time > start_time)
            );

            -- Session rosters
            CREATE TABLE IF NOT EXISTS enrollments (
                session_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                PRIMARY KEY (session_id, student_id),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            -- Issued check-in credentials
            CREATE TABLE IF NOT EXISTS credentials (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL,
                secret TEXT NOT NULL UNIQUE,
                issued_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                is_revoked INTEGER NOT NULL DEFAULT 0,
                CHECK (expires_at > issued_at),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            -- Students who consumed each credential
            CREATE TABLE IF NOT EXISTS credential_uses (
                credential_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                PRIMARY KEY (credential_id, student_id),
                FOREIGN KEY (credential_id) REFERENCES credentials(id) ON DELETE CASCADE
            );

            -- Accepted check-ins; the primary key is the uniqueness guarantee
            CREATE TABLE IF NOT EXISTS check_in_events (
                session_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                check_in_time TEXT NOT NULL,
                credential_id TEXT NOT NULL,
                PRIMARY KEY (session_id, student_id),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_credentials_session ON credentials(session_id);
            CREATE INDEX IF NOT EXISTS idx_credentials_expires ON credentials(expires_at);
            CREATE INDEX IF NOT EXISTS idx_check_in_events_credential ON check_in_events(credential_id);
        "#,
    },
    Migration {
        version: 3,
        description: "Widen stored timestamps to nanoseconds and index by student",
        sql: r#"
            UPDATE sessions SET start_time = substr(start_time, 1, 26) || '000Z' WHERE length(start_time) = 27;
            UPDATE sessions SET end_time = substr(end_time, 1, 26) || '000Z' WHERE length(end_time) = 27;
            UPDATE credentials SET issued_at = substr(issued_at, 1, 26) || '000Z' WHERE length(issued_at) = 27;
            UPDATE credentials SET expires_at = substr(expires_at, 1, 26) || '000Z' WHERE length(expires_at) = 27;
            UPDATE check_in_events SET check_in_time = substr(check_in_time, 1, 26) || '000Z' WHERE length(check_in_time) = 27;
            CREATE INDEX IF NOT EXISTS idx_check_in_events_student ON check_in_events(student_id);
            CREATE INDEX IF NOT EXISTS idx_enrollments_student ON enrollments(student_id);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            super::parse::format_datetime(&chrono::Utc::now())
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}
