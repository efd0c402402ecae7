//! Storage layer for Rollcall
//!
//! [`MemoryStore`] keeps everything in process; [`SqliteStore`] persists to
//! SQLite through a [`Database`] handle.

mod check_ins;
mod credentials;
mod memory;
mod migrations;
mod parse;
mod sessions;
mod traits;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{CheckInEvent, Credential, Session, SessionId, StudentId};

pub use check_ins::CheckInStore;
pub use credentials::CredentialStore;
pub use memory::MemoryStore;
pub use sessions::SessionStore;
pub use traits::{AttendanceStore, CredentialIndex, EventStore, SessionLookup};

/// How long SQLite waits on a locked database before reporting busy
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get session and roster store
    pub fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(&self.conn)
    }

    /// Get credential store
    pub fn credentials(&self) -> CredentialStore<'_> {
        CredentialStore::new(&self.conn)
    }

    /// Get check-in event store
    pub fn check_ins(&self) -> CheckInStore<'_> {
        CheckInStore::new(&self.conn)
    }
}

/// Thread-safe SQLite-backed store
///
/// The conditional insert on `check_in_events` is what guarantees one event
/// per (session, student); the mutex only serializes use of the connection.
///
/// Every call shares the one connection, so check-ins from all sessions
/// run one at a time, each holding the lock for a few statements. That is
/// enough for a classroom-scale burst. Deployments that need parallel
/// writers should open one `SqliteStore` per worker on the same file;
/// the busy timeout and the conditional insert keep that correct.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Database::open(path).map(Self::new)
    }

    pub fn open_in_memory() -> Result<Self> {
        Database::open_in_memory().map(Self::new)
    }

    /// Lock the underlying database for direct access
    pub fn lock(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| Error::StoreUnavailable("Database lock poisoned".to_string()))
    }
}

// Implement repository traits for SqliteStore
// This enables using the database through the trait interface

impl CredentialIndex for SqliteStore {
    fn put_credential(&self, credential: &Credential) -> Result<()> {
        self.lock()?.credentials().create(credential)
    }

    fn get_credential(&self, secret: &str) -> Result<Option<Credential>> {
        self.lock()?.credentials().find_by_secret(secret)
    }

    fn list_credentials_for_session(&self, session_id: SessionId) -> Result<Vec<Credential>> {
        self.lock()?.credentials().list_for_session(session_id)
    }

    fn record_consumption(&self, credential_id: Uuid, student_id: &StudentId) -> Result<()> {
        self.lock()?.credentials().record_use(credential_id, student_id)
    }

    fn revoke_credentials_for_session(
        &self,
        session_id: SessionId,
        keep: Option<Uuid>,
    ) -> Result<u64> {
        self.lock()?.credentials().revoke_for_session(session_id, keep)
    }

    fn prune_expired_credentials(&self, now: DateTime<Utc>) -> Result<u64> {
        self.lock()?.credentials().prune_expired(now)
    }
}

impl EventStore for SqliteStore {
    fn insert_event_if_absent(&self, event: &CheckInEvent) -> Result<bool> {
        self.lock()?.check_ins().insert_if_absent(event)
    }

    fn get_event(
        &self,
        session_id: SessionId,
        student_id: &StudentId,
    ) -> Result<Option<CheckInEvent>> {
        self.lock()?.check_ins().find(session_id, student_id)
    }

    fn list_events_for_session(&self, session_id: SessionId) -> Result<Vec<CheckInEvent>> {
        self.lock()?.check_ins().list_for_session(session_id)
    }

    fn list_events_for_student(&self, student_id: &StudentId) -> Result<Vec<CheckInEvent>> {
        self.lock()?.check_ins().list_for_student(student_id)
    }
}

impl SessionLookup for SqliteStore {
    fn get_session(&self, session_id: SessionId) -> Result<Option<Session>> {
        self.lock()?.sessions().find_by_id(session_id)
    }

    fn enrolled_students(&self, session_id: SessionId) -> Result<Vec<StudentId>> {
        self.lock()?.sessions().list_enrolled(session_id)
    }

    fn is_enrolled(&self, session_id: SessionId, student_id: &StudentId) -> Result<bool> {
        self.lock()?.sessions().is_enrolled(session_id, student_id)
    }

    fn sessions_for_student(&self, student_id: &StudentId) -> Result<Vec<Session>> {
        self.lock()?.sessions().list_for_student(student_id)
    }
}
