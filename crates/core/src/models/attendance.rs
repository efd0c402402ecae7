//! Classified attendance models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionId, StudentId};
use crate::error::Error;

/// Final attendance status for a student in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "PRESENT",
            AttendanceStatus::Late => "LATE",
            AttendanceStatus::Absent => "ABSENT",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "PRESENT" => Ok(AttendanceStatus::Present),
            "LATE" => Ok(AttendanceStatus::Late),
            "ABSENT" => Ok(AttendanceStatus::Absent),
            other => Err(Error::InvalidInput(format!(
                "unknown attendance status '{}'",
                other
            ))),
        }
    }
}

/// Classifier verdict
///
/// `Pending` means the session is still running and the student has not
/// checked in; it is not the same as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Pending,
    Final(AttendanceStatus),
}

impl Classification {
    pub fn status(&self) -> Option<AttendanceStatus> {
        match self {
            Classification::Pending => None,
            Classification::Final(status) => Some(*status),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Classification::Final(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Pending => "PENDING",
            Classification::Final(status) => status.as_str(),
        }
    }
}

/// Classified outcome for one (session, student) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub classification: Classification,
    /// Set whenever a check-in exists; always set for PRESENT and LATE
    pub check_in_time: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    pub fn status(&self) -> Option<AttendanceStatus> {
        self.classification.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_roundtrip() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Late,
            AttendanceStatus::Absent,
        ] {
            assert_eq!(status.as_str().parse::<AttendanceStatus>().unwrap(), status);
        }
        assert!("present".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_pending_is_not_absent() {
        assert_eq!(Classification::Pending.status(), None);
        assert!(!Classification::Pending.is_final());
        assert_eq!(Classification::Pending.label(), "PENDING");
        assert_eq!(
            Classification::Final(AttendanceStatus::Absent).label(),
            "ABSENT"
        );
    }
}
