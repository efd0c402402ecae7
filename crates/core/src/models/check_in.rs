//! Check-in event and validation outcome models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SessionId, StudentId};

/// A single accepted presentation of a credential
///
/// At most one exists per (session, student) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInEvent {
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub check_in_time: DateTime<Utc>,
    pub credential_id: Uuid,
}

impl CheckInEvent {
    pub fn new(
        session_id: SessionId,
        student_id: StudentId,
        check_in_time: DateTime<Utc>,
        credential_id: Uuid,
    ) -> Self {
        Self {
            session_id,
            student_id,
            check_in_time,
            credential_id,
        }
    }
}

/// Why a presentation was turned away
///
/// These are expected outcomes shown to the student, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    UnknownToken,
    SessionMismatch,
    Revoked,
    Expired,
    NotOpenYet,
    NotEnrolled,
    AlreadyCheckedIn,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::UnknownToken => "UNKNOWN_TOKEN",
            RejectReason::SessionMismatch => "SESSION_MISMATCH",
            RejectReason::Revoked => "REVOKED",
            RejectReason::Expired => "EXPIRED",
            RejectReason::NotOpenYet => "NOT_OPEN_YET",
            RejectReason::NotEnrolled => "NOT_ENROLLED",
            RejectReason::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
        }
    }

    /// Message suitable for direct display to the student
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::UnknownToken => "This QR code is not recognised",
            RejectReason::SessionMismatch => "This QR code belongs to a different session",
            RejectReason::Revoked => "This QR code has been replaced by a newer one",
            RejectReason::Expired => "This QR code has expired",
            RejectReason::NotOpenYet => "Attendance is not open yet",
            RejectReason::NotEnrolled => "You are not enrolled in this session",
            RejectReason::AlreadyCheckedIn => "You are already checked in",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of presenting a credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    Accepted(CheckInEvent),
    Rejected(RejectReason),
}

impl CheckInOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CheckInOutcome::Accepted(_))
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            CheckInOutcome::Accepted(_) => None,
            CheckInOutcome::Rejected(reason) => Some(*reason),
        }
    }

    pub fn check_in_time(&self) -> Option<DateTime<Utc>> {
        match self {
            CheckInOutcome::Accepted(event) => Some(event.check_in_time),
            CheckInOutcome::Rejected(_) => None,
        }
    }
}

/// Read-only scan preview: would this credential be accepted right now?
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub session_id: SessionId,
    pub reason: Option<RejectReason>,
    pub expires_at: Option<DateTime<Utc>>,
    pub already_checked_in: bool,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.reason.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serializes_as_code() {
        for reason in [
            RejectReason::UnknownToken,
            RejectReason::SessionMismatch,
            RejectReason::Revoked,
            RejectReason::Expired,
            RejectReason::NotOpenYet,
            RejectReason::NotEnrolled,
            RejectReason::AlreadyCheckedIn,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.code()));
        }
    }

    #[test]
    fn test_outcome_accessors() {
        let event = CheckInEvent::new(
            SessionId::new(),
            StudentId::parse("S-1").unwrap(),
            Utc::now(),
            Uuid::new_v4(),
        );
        let accepted = CheckInOutcome::Accepted(event.clone());
        assert!(accepted.is_accepted());
        assert_eq!(accepted.check_in_time(), Some(event.check_in_time));

        let rejected = CheckInOutcome::Rejected(RejectReason::Expired);
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.reason(), Some(RejectReason::Expired));
        assert_eq!(rejected.check_in_time(), None);
    }
}
