//! Storage repository traits
//!
//! These traits are the narrow interface the attendance core reads and
//! writes through, allowing for different implementations (SQLite,
//! in-memory, a remote backend).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CheckInEvent, Credential, Session, SessionId, StudentId};

/// Credential index keyed by secret value
pub trait CredentialIndex {
    /// Publish a credential; visible to lookups once this returns
    fn put_credential(&self, credential: &Credential) -> Result<()>;

    /// Find a credential by its secret value
    fn get_credential(&self, secret: &str) -> Result<Option<Credential>>;

    /// List credentials issued for a session, newest first
    fn list_credentials_for_session(&self, session_id: SessionId) -> Result<Vec<Credential>>;

    /// Record that a student checked in with a credential
    fn record_consumption(&self, credential_id: Uuid, student_id: &StudentId) -> Result<()>;

    /// Revoke every credential of a session except `keep`
    fn revoke_credentials_for_session(
        &self,
        session_id: SessionId,
        keep: Option<Uuid>,
    ) -> Result<u64>;

    /// Discard credentials whose validity window has closed
    fn prune_expired_credentials(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Check-in event storage keyed by (session, student)
pub trait EventStore {
    /// Conditional write; returns false if an event already exists for the pair
    fn insert_event_if_absent(&self, event: &CheckInEvent) -> Result<bool>;

    /// Find the event for a (session, student) pair
    fn get_event(&self, session_id: SessionId, student_id: &StudentId)
        -> Result<Option<CheckInEvent>>;

    /// List all events of a session
    fn list_events_for_session(&self, session_id: SessionId) -> Result<Vec<CheckInEvent>>;

    /// List a student's events across sessions, oldest first
    fn list_events_for_student(&self, student_id: &StudentId) -> Result<Vec<CheckInEvent>>;
}

/// Read-only view of course scheduling
pub trait SessionLookup {
    /// Find session by ID
    fn get_session(&self, session_id: SessionId) -> Result<Option<Session>>;

    /// Students on the session roster
    fn enrolled_students(&self, session_id: SessionId) -> Result<Vec<StudentId>>;

    /// Check whether a student is on the session roster
    fn is_enrolled(&self, session_id: SessionId, student_id: &StudentId) -> Result<bool>;

    /// Sessions whose roster includes the student
    fn sessions_for_student(&self, student_id: &StudentId) -> Result<Vec<Session>>;
}

/// Combined storage interface
///
/// Implementations may be backed by SQLite, memory, or network.
pub trait AttendanceStore: CredentialIndex + EventStore + SessionLookup + Send + Sync {}

// Blanket implementation: any type implementing all traits implements AttendanceStore
impl<T> AttendanceStore for T where T: CredentialIndex + EventStore + SessionLookup + Send + Sync {}
