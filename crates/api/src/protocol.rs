//! Request and response messages
//!
//! All messages are JSON with a `type` tag and camelCase fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rollcall_core::{
    AttendanceRecord, CheckInOutcome, Credential, RejectReason, SessionId, StudentId, Verification,
};

use crate::check_in_link::CheckInLink;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    pub session_id: SessionId,
    pub validity_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialResponse {
    pub credential_id: Uuid,
    pub session_id: SessionId,
    pub token: String,
    pub check_in_link: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&Credential> for IssueCredentialResponse {
    fn from(credential: &Credential) -> Self {
        Self {
            credential_id: credential.id,
            session_id: credential.session_id,
            token: credential.secret.expose_secret().to_string(),
            check_in_link: CheckInLink::for_credential(credential).to_url(),
            issued_at: credential.issued_at,
            expires_at: credential.expires_at,
        }
    }
}

/// A student presenting a scanned credential
///
/// `presentedAt` defaults to the server's clock when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub token: String,
    pub session_id: SessionId,
    pub student_id: StudentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presented_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
}

impl From<&CheckInOutcome> for CheckInResponse {
    fn from(outcome: &CheckInOutcome) -> Self {
        match outcome {
            CheckInOutcome::Accepted(event) => Self {
                accepted: true,
                reason: None,
                message: "Checked in".to_string(),
                check_in_time: Some(event.check_in_time),
            },
            CheckInOutcome::Rejected(reason) => Self {
                accepted: false,
                reason: Some(*reason),
                message: reason.message().to_string(),
                check_in_time: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub token: String,
    pub session_id: SessionId,
    pub student_id: StudentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub already_checked_in: bool,
}

impl From<&Verification> for VerifyResponse {
    fn from(verification: &Verification) -> Self {
        Self {
            valid: verification.is_valid(),
            reason: verification.reason,
            message: verification
                .reason
                .map(|r| r.message())
                .unwrap_or("Ready to check in")
                .to_string(),
            expires_at: verification.expires_at,
            already_checked_in: verification.already_checked_in,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: SessionId,
}

/// One row of an attendance report
///
/// `status` is one of PRESENT, LATE, ABSENT or PENDING.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecordDto {
    pub student_id: StudentId,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
}

impl From<&AttendanceRecord> for AttendanceRecordDto {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            student_id: record.student_id.clone(),
            status: record.classification.label().to_string(),
            check_in_time: record.check_in_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub session_id: SessionId,
    pub records: Vec<AttendanceRecordDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRequest {
    pub student_id: StudentId,
}

/// One session in a student's attendance history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAttendanceDto {
    pub session_id: SessionId,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
}

impl From<&AttendanceRecord> for SessionAttendanceDto {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            session_id: record.session_id,
            status: record.classification.label().to_string(),
            check_in_time: record.check_in_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceResponse {
    pub student_id: StudentId,
    pub sessions: Vec<SessionAttendanceDto>,
}

/// Credential listing without the secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSummary {
    pub credential_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub check_ins: usize,
}

impl From<&Credential> for CredentialSummary {
    fn from(credential: &Credential) -> Self {
        Self {
            credential_id: credential.id,
            issued_at: credential.issued_at,
            expires_at: credential.expires_at,
            check_ins: credential.consumed_by.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCredentialsResponse {
    pub session_id: SessionId,
    pub credentials: Vec<CredentialSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Incoming requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Instructor asks for a new QR credential
    IssueCredential(IssueCredentialRequest),

    /// Student presents a scanned credential
    CheckIn(CheckInRequest),

    /// Scan preview without recording
    Verify(VerifyRequest),

    /// Classified attendance for a session
    Attendance(SessionRequest),

    /// One student's attendance across sessions
    StudentAttendance(StudentRequest),

    /// Credentials still accepted for a session
    ActiveCredentials(SessionRequest),

    /// Invalidate every credential of a session
    RevokeCredentials(SessionRequest),

    /// Remove expired credentials
    PruneCredentials,
}

/// Outgoing responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    CredentialIssued(IssueCredentialResponse),
    CheckIn(CheckInResponse),
    Verification(VerifyResponse),
    Attendance(AttendanceResponse),
    StudentAttendance(StudentAttendanceResponse),
    ActiveCredentials(ActiveCredentialsResponse),
    Revoked(CountResponse),
    Pruned(CountResponse),
    Error(ErrorResponse),
}

impl Request {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Response {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            code: code.into(),
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_in_request_wire_format() {
        let raw = json!({
            "type": "check_in",
            "token": "abc",
            "sessionId": "550e8400-e29b-41d4-a716-446655440000",
            "studentId": "S-1"
        });
        let request = Request::from_bytes(raw.to_string().as_bytes()).unwrap();

        match request {
            Request::CheckIn(req) => {
                assert_eq!(req.token, "abc");
                assert_eq!(req.student_id.as_str(), "S-1");
                assert_eq!(req.presented_at, None);
            }
            other => panic!("Wrong request type: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_student_id_is_rejected() {
        let raw = json!({
            "type": "check_in",
            "token": "abc",
            "sessionId": "550e8400-e29b-41d4-a716-446655440000",
            "studentId": "not valid"
        });
        assert!(Request::from_bytes(raw.to_string().as_bytes()).is_err());
    }

    #[test]
    fn test_rejection_response_wire_format() {
        let response = Response::CheckIn(CheckInResponse::from(&CheckInOutcome::Rejected(
            RejectReason::AlreadyCheckedIn,
        )));
        let value: serde_json::Value = serde_json::from_slice(&response.to_bytes().unwrap()).unwrap();

        assert_eq!(value["type"], "check_in");
        assert_eq!(value["accepted"], false);
        assert_eq!(value["reason"], "ALREADY_CHECKED_IN");
        assert_eq!(value["message"], "You are already checked in");
        assert!(value.get("checkInTime").is_none());
    }

    #[test]
    fn test_prune_request_has_no_body() {
        let request = Request::from_bytes(br#"{"type":"prune_credentials"}"#).unwrap();
        assert_eq!(request, Request::PruneCredentials);
    }

    #[test]
    fn test_student_attendance_wire_format() {
        let request =
            Request::from_bytes(br#"{"type":"student_attendance","studentId":"S-1"}"#).unwrap();
        assert_eq!(
            request,
            Request::StudentAttendance(StudentRequest {
                student_id: StudentId::parse("S-1").unwrap(),
            })
        );

        let session_id: SessionId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        let response = Response::StudentAttendance(StudentAttendanceResponse {
            student_id: StudentId::parse("S-1").unwrap(),
            sessions: vec![SessionAttendanceDto {
                session_id,
                status: "PENDING".to_string(),
                check_in_time: None,
            }],
        });
        let value: serde_json::Value = serde_json::from_slice(&response.to_bytes().unwrap()).unwrap();
        assert_eq!(value["type"], "student_attendance");
        assert_eq!(value["studentId"], "S-1");
        assert_eq!(value["sessions"][0]["sessionId"], session_id.to_string());
        assert!(value["sessions"][0].get("checkInTime").is_none());
    }
}
