//! Credential storage operations

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    format_datetime, parse_datetime, parse_session_id, parse_student_id, parse_uuid, OptionalExt,
};
use crate::error::Result;
use crate::models::{Credential, SecretToken, SessionId, StudentId};

const CREDENTIAL_COLUMNS: &str = "id, session_id, secret, issued_at, expires_at, is_revoked";

fn credential_from_row(row: &Row<'_>) -> rusqlite::Result<Credential> {
    Ok(Credential {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        session_id: parse_session_id(&row.get::<_, String>(1)?)?,
        secret: SecretToken::from_stored(row.get(2)?),
        issued_at: parse_datetime(&row.get::<_, String>(3)?)?,
        expires_at: parse_datetime(&row.get::<_, String>(4)?)?,
        consumed_by: BTreeSet::new(),
        is_revoked: row.get::<_, i32>(5)? != 0,
    })
}

pub struct CredentialStore<'a> {
    conn: &'a Connection,
}

impl<'a> CredentialStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new credential
    #[instrument(skip(self, credential), fields(credential_id = %credential.id, session_id = %credential.session_id))]
    pub fn create(&self, credential: &Credential) -> Result<()> {
        self.conn.execute(
            "INSERT INTO credentials (id, session_id, secret, issued_at, expires_at, is_revoked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                credential.id.to_string(),
                credential.session_id.to_string(),
                credential.secret.expose_secret(),
                format_datetime(&credential.issued_at),
                format_datetime(&credential.expires_at),
                credential.is_revoked as i32,
            ],
        )?;

        for student_id in &credential.consumed_by {
            self.record_use(credential.id, student_id)?;
        }
        Ok(())
    }

    /// Find credential by secret value
    pub fn find_by_secret(&self, secret: &str) -> Result<Option<Credential>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM credentials WHERE secret = ?1",
            CREDENTIAL_COLUMNS
        ))?;

        let credential = stmt
            .query_row(params![secret], credential_from_row)
            .optional()?;

        match credential {
            Some(mut credential) => {
                credential.consumed_by = self.load_uses(credential.id)?;
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    /// List credentials for a session, newest first
    pub fn list_for_session(&self, session_id: SessionId) -> Result<Vec<Credential>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM credentials WHERE session_id = ?1 ORDER BY issued_at DESC",
            CREDENTIAL_COLUMNS
        ))?;

        let mut credentials = stmt
            .query_map(params![session_id.to_string()], credential_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for credential in &mut credentials {
            credential.consumed_by = self.load_uses(credential.id)?;
        }
        Ok(credentials)
    }

    fn load_uses(&self, credential_id: Uuid) -> Result<BTreeSet<StudentId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT student_id FROM credential_uses WHERE credential_id = ?1")?;

        let uses = stmt
            .query_map(params![credential_id.to_string()], |row| {
                parse_student_id(&row.get::<_, String>(0)?)
            })?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;

        Ok(uses)
    }

    /// Record that a student consumed a credential
    pub fn record_use(&self, credential_id: Uuid, student_id: &StudentId) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO credential_uses (credential_id, student_id) VALUES (?1, ?2)",
            params![credential_id.to_string(), student_id.as_str()],
        )?;
        Ok(())
    }

    /// Revoke all live credentials of a session, optionally sparing one
    #[instrument(skip(self))]
    pub fn revoke_for_session(&self, session_id: SessionId, keep: Option<Uuid>) -> Result<u64> {
        let count = self.conn.execute(
            "UPDATE credentials SET is_revoked = 1
             WHERE session_id = ?1 AND is_revoked = 0 AND (?2 IS NULL OR id != ?2)",
            params![session_id.to_string(), keep.map(|id| id.to_string())],
        )?;
        Ok(count as u64)
    }

    /// Delete credentials that expired at or before `now`
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let count = self.conn.execute(
            "DELETE FROM credentials WHERE expires_at <= ?1",
            params![format_datetime(&now)],
        )?;
        Ok(count as u64)
    }
}
