//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{AttendanceRecord, AttendanceStatus, Classification, Credential, Session};

/// Validate that a session's time window is well formed
pub fn assert_session_invariants(session: &Session) {
    debug_assert!(
        session.end_time > session.start_time,
        "Session {} ends at {} which is not after its start {}",
        session.id,
        session.end_time,
        session.start_time
    );
}

/// Validate that a credential's window is non-empty
pub fn assert_credential_invariants(credential: &Credential) {
    debug_assert!(
        credential.expires_at > credential.issued_at,
        "Credential {} expires at {} which is not after issue time {}",
        credential.id,
        credential.expires_at,
        credential.issued_at
    );

    debug_assert!(
        !credential.secret.expose_secret().is_empty(),
        "Credential {} has an empty secret",
        credential.id
    );
}

/// Validate that a record carries a check-in time whenever it claims attendance
pub fn assert_record_invariants(record: &AttendanceRecord) {
    let attended = matches!(
        record.classification,
        Classification::Final(AttendanceStatus::Present | AttendanceStatus::Late)
    );
    debug_assert!(
        !attended || record.check_in_time.is_some(),
        "Record for {} in session {} is {} without a check-in time",
        record.student_id,
        record.session_id,
        record.classification.label()
    );

    debug_assert!(
        !(record.classification == Classification::Pending && record.check_in_time.is_some()),
        "Record for {} in session {} is pending despite a check-in",
        record.student_id,
        record.session_id
    );
}
