//! Attendance classification
//!
//! A pure function of session timing, the optional check-in event and the
//! time of the query. No state is kept between calls, so reclassifying the
//! same inputs always gives the same answer.

use chrono::{DateTime, Utc};

use crate::config::{AfterEndPolicy, PolicyConfig};
use crate::invariants::assert_record_invariants;
use crate::models::{
    AttendanceRecord, AttendanceStatus, CheckInEvent, Classification, Session, StudentId,
};

#[derive(Debug, Clone, Copy)]
pub struct AttendanceClassifier {
    default_grace_minutes: u32,
    after_end: AfterEndPolicy,
}

impl AttendanceClassifier {
    pub fn new(default_grace_minutes: u32, after_end: AfterEndPolicy) -> Self {
        Self {
            default_grace_minutes,
            after_end,
        }
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self::new(policy.default_grace_minutes, policy.after_end_check_in)
    }

    pub fn classify(
        &self,
        session: &Session,
        event: Option<&CheckInEvent>,
        now: DateTime<Utc>,
    ) -> Classification {
        let Some(event) = event else {
            return if session.has_ended(now) {
                Classification::Final(AttendanceStatus::Absent)
            } else {
                Classification::Pending
            };
        };

        let status = if event.check_in_time >= session.end_time {
            match self.after_end {
                AfterEndPolicy::Late => AttendanceStatus::Late,
                AfterEndPolicy::Absent => AttendanceStatus::Absent,
            }
        } else if event.check_in_time <= session.on_time_deadline(self.default_grace_minutes) {
            AttendanceStatus::Present
        } else {
            AttendanceStatus::Late
        };
        Classification::Final(status)
    }

    /// Build the attendance record for one student
    pub fn record(
        &self,
        session: &Session,
        student_id: StudentId,
        event: Option<&CheckInEvent>,
        now: DateTime<Utc>,
    ) -> AttendanceRecord {
        let record = AttendanceRecord {
            session_id: session.id,
            student_id,
            classification: self.classify(session, event, now),
            check_in_time: event.map(|e| e.check_in_time),
        };
        assert_record_invariants(&record);
        record
    }
}

impl Default for AttendanceClassifier {
    fn default() -> Self {
        Self::from_policy(&PolicyConfig::default())
    }
}
