//! Check-in link generation and parsing
//!
//! Link format: rollcall://check-in/<session-id>/<token>
//!
//! This is the payload rendered into the QR code shown in class.

use std::str::FromStr;

use rollcall_core::{Credential, SessionId};

use crate::error::{Error, Result};

const SCHEME: &str = "rollcall://check-in/";

/// Parsed check-in link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInLink {
    pub session_id: SessionId,
    pub token: String,
}

impl CheckInLink {
    pub fn new(session_id: SessionId, token: String) -> Self {
        Self { session_id, token }
    }

    /// Build the link for a freshly issued credential
    pub fn for_credential(credential: &Credential) -> Self {
        Self {
            session_id: credential.session_id,
            token: credential.secret.expose_secret().to_string(),
        }
    }

    /// Format as URL string
    pub fn to_url(&self) -> String {
        format!("{}{}/{}", SCHEME, self.session_id, self.token)
    }

    /// Parse from URL string
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::InvalidLink(format!("missing {} prefix", SCHEME)))?;

        let (session, token) = rest
            .split_once('/')
            .ok_or_else(|| Error::InvalidLink("expected session-id/token".into()))?;

        let session_id = SessionId::parse(session)
            .map_err(|_| Error::InvalidLink(format!("bad session id '{}'", session)))?;

        if token.is_empty() {
            return Err(Error::InvalidLink("empty token".into()));
        }
        if !token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidLink("token is not URL-safe base64".into()));
        }

        Ok(Self {
            session_id,
            token: token.to_string(),
        })
    }
}

impl std::fmt::Display for CheckInLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for CheckInLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
