//! Check-in validation
//!
//! Screening order: credential lookup, session match, revocation, validity
//! window, opening time, enrollment, duplicate check, conditional insert.
//! Rejections are returned as [`CheckInOutcome::Rejected`]; only store and
//! lookup failures are errors.

use std::cell::Cell;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument};

use crate::config::PolicyConfig;
use crate::error::{Error, Result};
use crate::models::{
    CheckInEvent, CheckInOutcome, Credential, RejectReason, SessionId, StudentId, Verification,
};
use crate::retry::with_retry;
use crate::storage::AttendanceStore;

/// Result of the read-only checks shared by validation and preview
enum Screening {
    Passed(Credential),
    Rejected {
        reason: RejectReason,
        expires_at: Option<DateTime<Utc>>,
    },
}

pub struct CheckInValidator<'a, S> {
    store: &'a S,
    policy: &'a PolicyConfig,
}

impl<'a, S: AttendanceStore> CheckInValidator<'a, S> {
    pub fn new(store: &'a S, policy: &'a PolicyConfig) -> Self {
        Self { store, policy }
    }

    /// Validate a presented credential and record the check-in on success
    #[instrument(skip_all, fields(%session_id, %student_id))]
    pub fn validate(
        &self,
        secret: &str,
        session_id: SessionId,
        student_id: &StudentId,
        presented_at: DateTime<Utc>,
    ) -> Result<CheckInOutcome> {
        let credential = match self.screen(secret, session_id, student_id, presented_at)? {
            Screening::Passed(credential) => credential,
            Screening::Rejected { reason, .. } => return Ok(self.reject(reason)),
        };

        let retry = &self.policy.retry;
        let existing = with_retry(retry, "get_event", || {
            self.store.get_event(session_id, student_id)
        })?;
        if existing.is_some() {
            return Ok(self.reject(RejectReason::AlreadyCheckedIn));
        }

        let event = CheckInEvent::new(session_id, student_id.clone(), presented_at, credential.id);
        let attempts = Cell::new(0u32);
        let inserted = with_retry(retry, "insert_event", || {
            attempts.set(attempts.get() + 1);
            self.store.insert_event_if_absent(&event)
        })?;
        if !inserted {
            // A retried insert can find the row its own timed-out attempt wrote
            let stored = if attempts.get() > 1 {
                with_retry(retry, "get_event", || {
                    self.store.get_event(session_id, student_id)
                })?
            } else {
                None
            };
            if stored.as_ref() != Some(&event) {
                // Lost the race to a concurrent scan by the same student
                return Ok(self.reject(RejectReason::AlreadyCheckedIn));
            }
            debug!("Insert committed before a transient store failure");
        }

        // The event is the record of truth; a failed consumption write only
        // loses traceability on the credential.
        if let Err(e) = with_retry(retry, "record_consumption", || {
            self.store.record_consumption(credential.id, student_id)
        }) {
            error!(credential_id = %credential.id, error = %e, "Failed to record credential consumption");
        }

        info!(credential_id = %credential.id, check_in_time = %presented_at, "Check-in accepted");
        Ok(CheckInOutcome::Accepted(event))
    }

    /// Report whether a credential would be accepted at `now`, writing nothing
    #[instrument(skip_all, fields(%session_id, %student_id))]
    pub fn verify(
        &self,
        secret: &str,
        session_id: SessionId,
        student_id: &StudentId,
        now: DateTime<Utc>,
    ) -> Result<Verification> {
        let already_checked_in = with_retry(&self.policy.retry, "get_event", || {
            self.store.get_event(session_id, student_id)
        })?
        .is_some();

        let verification = match self.screen(secret, session_id, student_id, now)? {
            Screening::Passed(credential) => Verification {
                session_id,
                reason: already_checked_in.then_some(RejectReason::AlreadyCheckedIn),
                expires_at: Some(credential.expires_at),
                already_checked_in,
            },
            Screening::Rejected { reason, expires_at } => Verification {
                session_id,
                reason: Some(reason),
                expires_at,
                already_checked_in,
            },
        };
        Ok(verification)
    }

    fn screen(
        &self,
        secret: &str,
        session_id: SessionId,
        student_id: &StudentId,
        at: DateTime<Utc>,
    ) -> Result<Screening> {
        let retry = &self.policy.retry;
        let rejected = |reason: RejectReason, expires_at: Option<DateTime<Utc>>| -> Result<Screening> {
            Ok(Screening::Rejected { reason, expires_at })
        };

        let credential = match with_retry(retry, "get_credential", || {
            self.store.get_credential(secret)
        })? {
            Some(credential) => credential,
            None => return rejected(RejectReason::UnknownToken, None),
        };

        if credential.session_id != session_id {
            return rejected(RejectReason::SessionMismatch, None);
        }
        let expires_at = Some(credential.expires_at);
        if credential.is_revoked {
            return rejected(RejectReason::Revoked, expires_at);
        }
        if !credential.window_contains(at) {
            return rejected(RejectReason::Expired, expires_at);
        }

        let session = with_retry(retry, "get_session", || self.store.get_session(session_id))?
            .ok_or(Error::SessionNotFound(session_id))?;
        if at < session.start_time - self.policy.early_check_in_window() {
            return rejected(RejectReason::NotOpenYet, expires_at);
        }

        if self.policy.enforce_enrollment {
            let enrolled = with_retry(retry, "is_enrolled", || {
                self.store.is_enrolled(session_id, student_id)
            })?;
            if !enrolled {
                return rejected(RejectReason::NotEnrolled, expires_at);
            }
        }

        Ok(Screening::Passed(credential))
    }

    fn reject(&self, reason: RejectReason) -> CheckInOutcome {
        debug!(%reason, "Check-in rejected");
        CheckInOutcome::Rejected(reason)
    }
}
