//! Session and roster storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{format_datetime, parse_datetime, parse_session_id, parse_student_id, OptionalExt};
use crate::error::Result;
use crate::models::{Session, SessionId, StudentId};

const SESSION_COLUMNS: &str = "s.id, s.start_time, s.end_time, s.grace_minutes";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: parse_session_id(&row.get::<_, String>(0)?)?,
        start_time: parse_datetime(&row.get::<_, String>(1)?)?,
        end_time: parse_datetime(&row.get::<_, String>(2)?)?,
        grace_minutes: row.get(3)?,
    })
}

pub struct SessionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SessionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new session
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn create(&self, session: &Session) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (id, start_time, end_time, grace_minutes) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.to_string(),
                format_datetime(&session.start_time),
                format_datetime(&session.end_time),
                session.grace_minutes,
            ],
        )?;
        Ok(())
    }

    /// Find session by ID
    pub fn find_by_id(&self, id: SessionId) -> Result<Option<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sessions s WHERE s.id = ?1",
            SESSION_COLUMNS
        ))?;

        let session = stmt
            .query_row(params![id.to_string()], session_from_row)
            .optional()?;

        Ok(session)
    }

    /// Sessions a student is enrolled in, ordered by start time
    pub fn list_for_student(&self, student_id: &StudentId) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sessions s
             JOIN enrollments e ON e.session_id = s.id
             WHERE e.student_id = ?1
             ORDER BY s.start_time, s.id",
            SESSION_COLUMNS
        ))?;

        let sessions = stmt
            .query_map(params![student_id.as_str()], session_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sessions)
    }

    /// Add a student to the session roster; false if already enrolled
    #[instrument(skip(self))]
    pub fn enroll(&self, session_id: SessionId, student_id: &StudentId) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO enrollments (session_id, student_id) VALUES (?1, ?2)",
            params![session_id.to_string(), student_id.as_str()],
        )?;
        Ok(inserted == 1)
    }

    /// List enrolled students ordered by student ID
    pub fn list_enrolled(&self, session_id: SessionId) -> Result<Vec<StudentId>> {
        let mut stmt = self.conn.prepare(
            "SELECT student_id FROM enrollments WHERE session_id = ?1 ORDER BY student_id",
        )?;

        let students = stmt
            .query_map(params![session_id.to_string()], |row| {
                parse_student_id(&row.get::<_, String>(0)?)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(students)
    }

    /// Check roster membership
    pub fn is_enrolled(&self, session_id: SessionId, student_id: &StudentId) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM enrollments WHERE session_id = ?1 AND student_id = ?2",
                params![session_id.to_string(), student_id.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
