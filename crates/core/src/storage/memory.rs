//! In-memory attendance store
//!
//! Suitable for tests and single-process deployments. Check-in events are
//! spread over independently locked shards so concurrent check-ins by
//! different students rarely touch the same lock.

use std::collections::hash_map::{DefaultHasher, Entry};
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::traits::{CredentialIndex, EventStore, SessionLookup};
use crate::error::{Error, Result};
use crate::models::{CheckInEvent, Credential, Session, SessionId, StudentId};

const EVENT_SHARDS: usize = 16;

type EventKey = (SessionId, StudentId);

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| Error::StoreUnavailable("Lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| Error::StoreUnavailable("Lock poisoned".to_string()))
}

/// In-memory implementation of every storage trait
#[derive(Debug)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    rosters: RwLock<HashMap<SessionId, BTreeSet<StudentId>>>,
    /// Credentials keyed by secret value
    credentials: RwLock<HashMap<String, Credential>>,
    events: Vec<RwLock<HashMap<EventKey, CheckInEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            rosters: RwLock::new(HashMap::new()),
            credentials: RwLock::new(HashMap::new()),
            events: (0..EVENT_SHARDS).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    /// Register a session (normally done by course scheduling)
    pub fn add_session(&self, session: Session) -> Result<()> {
        write(&self.sessions)?.insert(session.id, session);
        Ok(())
    }

    /// Add a student to a session roster
    pub fn enroll(&self, session_id: SessionId, student_id: StudentId) -> Result<bool> {
        Ok(write(&self.rosters)?
            .entry(session_id)
            .or_default()
            .insert(student_id))
    }

    /// Number of credentials currently indexed
    pub fn credential_count(&self) -> Result<usize> {
        Ok(read(&self.credentials)?.len())
    }

    fn shard(&self, session_id: SessionId, student_id: &StudentId) -> &RwLock<HashMap<EventKey, CheckInEvent>> {
        let mut hasher = DefaultHasher::new();
        session_id.hash(&mut hasher);
        student_id.hash(&mut hasher);
        &self.events[(hasher.finish() as usize) % self.events.len()]
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialIndex for MemoryStore {
    fn put_credential(&self, credential: &Credential) -> Result<()> {
        let mut credentials = write(&self.credentials)?;
        let secret = credential.secret.expose_secret();
        if credentials.contains_key(secret) {
            return Err(Error::InvalidInput("duplicate credential secret".into()));
        }
        credentials.insert(secret.to_string(), credential.clone());
        Ok(())
    }

    fn get_credential(&self, secret: &str) -> Result<Option<Credential>> {
        Ok(read(&self.credentials)?.get(secret).cloned())
    }

    fn list_credentials_for_session(&self, session_id: SessionId) -> Result<Vec<Credential>> {
        let mut credentials: Vec<_> = read(&self.credentials)?
            .values()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect();
        credentials.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
        Ok(credentials)
    }

    fn record_consumption(&self, credential_id: Uuid, student_id: &StudentId) -> Result<()> {
        if let Some(credential) = write(&self.credentials)?
            .values_mut()
            .find(|c| c.id == credential_id)
        {
            credential.consumed_by.insert(student_id.clone());
        }
        Ok(())
    }

    fn revoke_credentials_for_session(
        &self,
        session_id: SessionId,
        keep: Option<Uuid>,
    ) -> Result<u64> {
        let mut count = 0;
        for credential in write(&self.credentials)?.values_mut() {
            if credential.session_id == session_id
                && !credential.is_revoked
                && Some(credential.id) != keep
            {
                credential.is_revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }

    fn prune_expired_credentials(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut credentials = write(&self.credentials)?;
        let before = credentials.len();
        credentials.retain(|_, c| !c.is_expired(now));
        Ok((before - credentials.len()) as u64)
    }
}

impl EventStore for MemoryStore {
    fn insert_event_if_absent(&self, event: &CheckInEvent) -> Result<bool> {
        let mut shard = write(self.shard(event.session_id, &event.student_id))?;
        match shard.entry((event.session_id, event.student_id.clone())) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(event.clone());
                Ok(true)
            }
        }
    }

    fn get_event(
        &self,
        session_id: SessionId,
        student_id: &StudentId,
    ) -> Result<Option<CheckInEvent>> {
        Ok(read(self.shard(session_id, student_id))?
            .get(&(session_id, student_id.clone()))
            .cloned())
    }

    fn list_events_for_session(&self, session_id: SessionId) -> Result<Vec<CheckInEvent>> {
        let mut events = Vec::new();
        for shard in &self.events {
            events.extend(
                read(shard)?
                    .values()
                    .filter(|e| e.session_id == session_id)
                    .cloned(),
            );
        }
        events.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        Ok(events)
    }

    fn list_events_for_student(&self, student_id: &StudentId) -> Result<Vec<CheckInEvent>> {
        let mut events = Vec::new();
        for shard in &self.events {
            events.extend(
                read(shard)?
                    .values()
                    .filter(|e| &e.student_id == student_id)
                    .cloned(),
            );
        }
        events.sort_by(|a, b| {
            a.check_in_time
                .cmp(&b.check_in_time)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(events)
    }
}

impl SessionLookup for MemoryStore {
    fn get_session(&self, session_id: SessionId) -> Result<Option<Session>> {
        Ok(read(&self.sessions)?.get(&session_id).cloned())
    }

    fn enrolled_students(&self, session_id: SessionId) -> Result<Vec<StudentId>> {
        Ok(read(&self.rosters)?
            .get(&session_id)
            .map(|roster| roster.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn is_enrolled(&self, session_id: SessionId, student_id: &StudentId) -> Result<bool> {
        Ok(read(&self.rosters)?
            .get(&session_id)
            .is_some_and(|roster| roster.contains(student_id)))
    }

    fn sessions_for_student(&self, student_id: &StudentId) -> Result<Vec<Session>> {
        let session_ids: Vec<SessionId> = read(&self.rosters)?
            .iter()
            .filter(|(_, roster)| roster.contains(student_id))
            .map(|(id, _)| *id)
            .collect();
        let sessions = read(&self.sessions)?;
        let mut found: Vec<Session> = session_ids
            .iter()
            .filter_map(|id| sessions.get(id).cloned())
            .collect();
        found.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}
