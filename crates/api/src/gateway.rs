//! Request dispatch onto the attendance service
//!
//! Rejections travel as ordinary responses; only faults become
//! [`Response::Error`].

use tracing::{debug, error, warn};

use rollcall_core::{AttendanceService, AttendanceStore};

use crate::error::{Error, Result};
use crate::protocol::{
    ActiveCredentialsResponse, AttendanceRecordDto, AttendanceResponse, CheckInResponse,
    CountResponse, CredentialSummary, IssueCredentialResponse, Request, Response,
    SessionAttendanceDto, StudentAttendanceResponse, VerifyResponse,
};

pub struct Gateway<S> {
    service: AttendanceService<S>,
}

impl<S: AttendanceStore> Gateway<S> {
    pub fn new(service: AttendanceService<S>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &AttendanceService<S> {
        &self.service
    }

    /// Handle a raw JSON request
    pub fn handle_bytes(&self, bytes: &[u8]) -> Response {
        match Request::from_bytes(bytes) {
            Ok(request) => self.handle(request),
            Err(e) => {
                let err = Error::Protocol(format!("Invalid JSON: {}", e));
                debug!(error = %err, "Malformed request");
                Response::error(err.code(), err.to_string())
            }
        }
    }

    /// Handle a decoded request
    pub fn handle(&self, request: Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                if matches!(e.code(), "INTERNAL" | "STORE_UNAVAILABLE") {
                    error!(error = %e, "Request failed");
                } else {
                    warn!(error = %e, "Request refused");
                }
                Response::error(e.code(), e.to_string())
            }
        }
    }

    fn dispatch(&self, request: Request) -> Result<Response> {
        let service = &self.service;
        let response = match request {
            Request::IssueCredential(req) => {
                let credential = service.issue_credential(req.session_id, req.validity_minutes)?;
                Response::CredentialIssued(IssueCredentialResponse::from(&credential))
            }
            Request::CheckIn(req) => {
                let outcome = match req.presented_at {
                    Some(at) => {
                        service.submit_check_in(&req.token, req.session_id, &req.student_id, at)?
                    }
                    None => {
                        service.submit_check_in_now(&req.token, req.session_id, &req.student_id)?
                    }
                };
                Response::CheckIn(CheckInResponse::from(&outcome))
            }
            Request::Verify(req) => {
                let verification =
                    service.verify_credential(&req.token, req.session_id, &req.student_id)?;
                Response::Verification(VerifyResponse::from(&verification))
            }
            Request::Attendance(req) => {
                let records = service.attendance_for_session(req.session_id)?;
                Response::Attendance(AttendanceResponse {
                    session_id: req.session_id,
                    records: records.iter().map(AttendanceRecordDto::from).collect(),
                })
            }
            Request::StudentAttendance(req) => {
                let records = service.attendance_for_student(&req.student_id)?;
                Response::StudentAttendance(StudentAttendanceResponse {
                    sessions: records.iter().map(SessionAttendanceDto::from).collect(),
                    student_id: req.student_id,
                })
            }
            Request::ActiveCredentials(req) => {
                let credentials = service.active_credentials(req.session_id)?;
                Response::ActiveCredentials(ActiveCredentialsResponse {
                    session_id: req.session_id,
                    credentials: credentials.iter().map(CredentialSummary::from).collect(),
                })
            }
            Request::RevokeCredentials(req) => Response::Revoked(CountResponse {
                count: service.revoke_credentials(req.session_id)?,
            }),
            Request::PruneCredentials => Response::Pruned(CountResponse {
                count: service.prune_expired_credentials()?,
            }),
        };
        Ok(response)
    }
}
