//! Check-in event storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{
    format_datetime, parse_datetime, parse_session_id, parse_student_id, parse_uuid, OptionalExt,
};
use crate::error::Result;
use crate::models::{CheckInEvent, SessionId, StudentId};

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<CheckInEvent> {
    Ok(CheckInEvent {
        session_id: parse_session_id(&row.get::<_, String>(0)?)?,
        student_id: parse_student_id(&row.get::<_, String>(1)?)?,
        check_in_time: parse_datetime(&row.get::<_, String>(2)?)?,
        credential_id: parse_uuid(&row.get::<_, String>(3)?)?,
    })
}

pub struct CheckInStore<'a> {
    conn: &'a Connection,
}

impl<'a> CheckInStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert unless the (session, student) pair already has an event
    #[instrument(skip(self, event), fields(session_id = %event.session_id, student_id = %event.student_id))]
    pub fn insert_if_absent(&self, event: &CheckInEvent) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO check_in_events (session_id, student_id, check_in_time, credential_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id, student_id) DO NOTHING",
            params![
                event.session_id.to_string(),
                event.student_id.as_str(),
                format_datetime(&event.check_in_time),
                event.credential_id.to_string(),
            ],
        )?;
        Ok(inserted == 1)
    }

    /// Find the event for a (session, student) pair
    pub fn find(&self, session_id: SessionId, student_id: &StudentId) -> Result<Option<CheckInEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, student_id, check_in_time, credential_id
             FROM check_in_events WHERE session_id = ?1 AND student_id = ?2",
        )?;

        let event = stmt
            .query_row(
                params![session_id.to_string(), student_id.as_str()],
                event_from_row,
            )
            .optional()?;

        Ok(event)
    }

    /// List events of a session ordered by student ID
    pub fn list_for_session(&self, session_id: SessionId) -> Result<Vec<CheckInEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, student_id, check_in_time, credential_id
             FROM check_in_events WHERE session_id = ?1 ORDER BY student_id",
        )?;

        let events = stmt
            .query_map(params![session_id.to_string()], event_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// List a student's events across sessions, oldest first
    pub fn list_for_student(&self, student_id: &StudentId) -> Result<Vec<CheckInEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, student_id, check_in_time, credential_id
             FROM check_in_events WHERE student_id = ?1 ORDER BY check_in_time, session_id",
        )?;

        let events = stmt
            .query_map(params![student_id.as_str()], event_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }
}
