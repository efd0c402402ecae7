//! Subcommand implementations

use std::io::{Read, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rollcall_api::protocol::{
    AttendanceRecordDto, CheckInResponse, SessionAttendanceDto, VerifyResponse,
};
use rollcall_api::CheckInLink;
use rollcall_core::{Session, SessionId, StudentId};

use crate::state::AppState;

pub fn add_session(
    app: &AppState,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    grace: Option<u32>,
) -> Result<()> {
    let session = create_session(app, start, end, grace)?;
    println!("{}", session.id);
    Ok(())
}

fn create_session(
    app: &AppState,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    grace: Option<u32>,
) -> Result<Session> {
    let mut session = Session::new(start, end)?;
    if let Some(minutes) = grace {
        session = session.with_grace_minutes(minutes);
    }
    app.service().store().lock()?.sessions().create(&session)?;
    tracing::info!(session_id = %session.id, "Session registered");
    Ok(session)
}

pub fn enroll(app: &AppState, session: SessionId, students: &[String]) -> Result<()> {
    let added = enroll_students(app, session, students)?;
    println!("Enrolled {} of {} students", added, students.len());
    Ok(())
}

fn enroll_students(app: &AppState, session: SessionId, students: &[String]) -> Result<usize> {
    let ids = students
        .iter()
        .map(|s| StudentId::parse(s))
        .collect::<rollcall_core::Result<Vec<_>>>()?;

    let db = app.service().store().lock()?;
    if db.sessions().find_by_id(session)?.is_none() {
        bail!("Session {} not found", session);
    }
    let mut added = 0;
    for id in &ids {
        if db.sessions().enroll(session, id)? {
            added += 1;
        }
    }
    Ok(added)
}

pub fn issue(app: &AppState, session: SessionId, minutes: i64) -> Result<()> {
    let credential = app.service().issue_credential(session, minutes)?;
    println!("{}", CheckInLink::for_credential(&credential));
    println!("expires {}", credential.expires_at.to_rfc3339());
    Ok(())
}

pub fn check_in(
    app: &AppState,
    link: &str,
    student: &str,
    at: Option<DateTime<Utc>>,
) -> Result<()> {
    let link = CheckInLink::parse(link)?;
    let student = StudentId::parse(student)?;
    let service = app.service();
    let outcome = match at {
        Some(at) => service.submit_check_in(&link.token, link.session_id, &student, at)?,
        None => service.submit_check_in_now(&link.token, link.session_id, &student)?,
    };

    let response = CheckInResponse::from(&outcome);
    match (response.reason, response.check_in_time) {
        (Some(reason), _) => println!("REJECTED {}: {}", reason, response.message),
        (None, Some(time)) => println!("ACCEPTED at {}", time.to_rfc3339()),
        (None, None) => println!("ACCEPTED"),
    }
    Ok(())
}

pub fn verify(app: &AppState, link: &str, student: &str) -> Result<()> {
    let link = CheckInLink::parse(link)?;
    let student = StudentId::parse(student)?;
    let verification = app
        .service()
        .verify_credential(&link.token, link.session_id, &student)?;

    let response = VerifyResponse::from(&verification);
    println!("{}", response.message);
    if let Some(expires_at) = response.expires_at {
        println!("expires {}", expires_at.to_rfc3339());
    }
    Ok(())
}

pub fn report(app: &AppState, session: SessionId, json: bool) -> Result<()> {
    let records: Vec<_> = app
        .service()
        .attendance_for_session(session)?
        .iter()
        .map(AttendanceRecordDto::from)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        let time = record
            .check_in_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {:<8} {}", record.student_id.as_str(), record.status, time);
    }
    Ok(())
}

pub fn history(app: &AppState, student: &str, json: bool) -> Result<()> {
    let student = StudentId::parse(student)?;
    let sessions = student_history(app, &student)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    for entry in &sessions {
        let time = entry
            .check_in_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {:<8} {}", entry.session_id, entry.status, time);
    }
    Ok(())
}

fn student_history(app: &AppState, student: &StudentId) -> Result<Vec<SessionAttendanceDto>> {
    Ok(app
        .service()
        .attendance_for_student(student)?
        .iter()
        .map(SessionAttendanceDto::from)
        .collect())
}

pub fn active(app: &AppState, session: SessionId) -> Result<()> {
    for credential in app.service().active_credentials(session)? {
        println!(
            "{} expires {} ({} check-ins)",
            credential.id,
            credential.expires_at.to_rfc3339(),
            credential.consumed_by.len()
        );
    }
    Ok(())
}

pub fn revoke(app: &AppState, session: SessionId) -> Result<()> {
    let count = app.service().revoke_credentials(session)?;
    println!("Revoked {} credentials", count);
    Ok(())
}

pub fn prune(app: &AppState) -> Result<()> {
    let count = app.service().prune_expired_credentials()?;
    println!("Pruned {} credentials", count);
    Ok(())
}

/// Answer one JSON request
pub fn handle(app: &AppState, mut input: impl Read, mut output: impl Write) -> Result<()> {
    let mut request = Vec::new();
    input
        .read_to_end(&mut request)
        .context("Failed to read request")?;

    let response = app.gateway.handle_bytes(&request);
    output.write_all(&response.to_bytes()?)?;
    writeln!(output)?;
    Ok(())
}
