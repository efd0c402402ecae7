//! Credential issuance
//!
//! A credential is bound to one session and lives for the requested
//! duration, but never longer than the session's end plus the configured
//! token grace.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument};

use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::error::{Error, Result};
use crate::invariants::assert_credential_invariants;
use crate::models::{Credential, SessionId};
use crate::retry::with_retry;
use crate::storage::{CredentialIndex, SessionLookup};

/// Attempts at drawing a secret that is not already indexed
const MAX_SECRET_DRAWS: u32 = 3;

pub struct TokenIssuer<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
    policy: &'a PolicyConfig,
}

impl<'a, S> TokenIssuer<'a, S>
where
    S: CredentialIndex + SessionLookup,
{
    pub fn new(store: &'a S, clock: &'a dyn Clock, policy: &'a PolicyConfig) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Issue and publish a credential for a session
    #[instrument(skip(self), fields(validity_secs = validity.num_seconds()))]
    pub fn issue(&self, session_id: SessionId, validity: Duration) -> Result<Credential> {
        if validity <= Duration::zero() {
            return Err(Error::InvalidDuration(format!(
                "validity must be positive, got {} seconds",
                validity.num_seconds()
            )));
        }
        if validity > self.policy.max_validity() {
            return Err(Error::InvalidDuration(format!(
                "validity of {} minutes exceeds the maximum of {} minutes",
                validity.num_minutes(),
                self.policy.max_validity_minutes
            )));
        }

        let retry = &self.policy.retry;
        let session = with_retry(retry, "get_session", || self.store.get_session(session_id))?
            .ok_or(Error::SessionNotFound(session_id))?;

        let now = self.clock.now();
        if session.has_ended(now) {
            return Err(Error::SessionClosed(session_id));
        }

        let expires_at = (now + validity).min(session.end_time + self.policy.token_grace_after_end());
        let credential = self.fresh_credential(session_id, now, expires_at)?;
        assert_credential_invariants(&credential);

        with_retry(retry, "put_credential", || self.store.put_credential(&credential))?;

        if self.policy.single_active_token {
            let revoked = with_retry(retry, "revoke_credentials", || {
                self.store
                    .revoke_credentials_for_session(session_id, Some(credential.id))
            })?;
            if revoked > 0 {
                info!(%session_id, revoked, "Superseded earlier credentials");
            }
        }

        info!(
            %session_id,
            credential_id = %credential.id,
            expires_at = %credential.expires_at,
            "Issued check-in credential"
        );
        Ok(credential)
    }

    fn fresh_credential(
        &self,
        session_id: SessionId,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Credential> {
        for _ in 0..MAX_SECRET_DRAWS {
            let credential = Credential::new(session_id, issued_at, expires_at);
            let taken = with_retry(&self.policy.retry, "get_credential", || {
                self.store.get_credential(credential.secret.expose_secret())
            })?;
            if taken.is_none() {
                return Ok(credential);
            }
        }
        Err(Error::InvalidOperation(
            "could not draw an unused credential secret".into(),
        ))
    }
}
