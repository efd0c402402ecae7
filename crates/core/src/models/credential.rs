//! Session-bound check-in credential model

use std::collections::BTreeSet;
use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use super::{SessionId, StudentId};

/// Number of random bytes behind each secret
pub const SECRET_BYTES: usize = 32;

/// Opaque credential secret carried in the QR code
///
/// `Debug` and `Display` never print the value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretToken(String);

impl SecretToken {
    /// Draw a fresh secret from the operating system's CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a secret read back from storage
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Ephemeral proof that a check-in is authorized for one session
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: Uuid,
    pub session_id: SessionId,
    pub secret: SecretToken,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Students who checked in with this credential
    pub consumed_by: BTreeSet<StudentId>,
    pub is_revoked: bool,
}

impl Credential {
    pub fn new(session_id: SessionId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            secret: SecretToken::generate(),
            issued_at,
            expires_at,
            consumed_by: BTreeSet::new(),
            is_revoked: false,
        }
    }

    /// Half-open validity window `[issued_at, expires_at)`
    pub fn window_contains(&self, at: DateTime<Utc>) -> bool {
        self.issued_at <= at && at < self.expires_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.window_contains(now)
    }
}
