//! Attendance service
//!
//! The operations the surrounding application calls: issue a credential,
//! submit a check-in, read the classified attendance of a session or of a
//! student. Issuance, validation and classification are delegated to
//! [`TokenIssuer`], [`CheckInValidator`] and [`AttendanceClassifier`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};

use crate::classifier::AttendanceClassifier;
use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::error::{Error, Result};
use crate::invariants::assert_session_invariants;
use crate::issuer::TokenIssuer;
use crate::models::{
    AttendanceRecord, CheckInOutcome, Credential, SessionId, StudentId, Verification,
};
use crate::retry::with_retry;
use crate::storage::AttendanceStore;
use crate::validator::CheckInValidator;

pub struct AttendanceService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: PolicyConfig,
    classifier: AttendanceClassifier,
}

impl<S: AttendanceStore> AttendanceService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, policy: PolicyConfig) -> Result<Self> {
        policy.validate()?;
        let classifier = AttendanceClassifier::from_policy(&policy);
        Ok(Self {
            store,
            clock,
            policy,
            classifier,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    fn issuer(&self) -> TokenIssuer<'_, S> {
        TokenIssuer::new(self.store.as_ref(), self.clock.as_ref(), &self.policy)
    }

    fn validator(&self) -> CheckInValidator<'_, S> {
        CheckInValidator::new(self.store.as_ref(), &self.policy)
    }

    /// Issue a credential valid for `validity_minutes`
    pub fn issue_credential(&self, session_id: SessionId, validity_minutes: i64) -> Result<Credential> {
        let validity = Duration::try_minutes(validity_minutes).ok_or_else(|| {
            Error::InvalidDuration(format!("{} minutes is out of range", validity_minutes))
        })?;
        self.issuer().issue(session_id, validity)
    }

    /// Present a credential on behalf of a student
    pub fn submit_check_in(
        &self,
        secret: &str,
        session_id: SessionId,
        student_id: &StudentId,
        presented_at: DateTime<Utc>,
    ) -> Result<CheckInOutcome> {
        self.validator()
            .validate(secret, session_id, student_id, presented_at)
    }

    /// Present a credential at the current clock time
    pub fn submit_check_in_now(
        &self,
        secret: &str,
        session_id: SessionId,
        student_id: &StudentId,
    ) -> Result<CheckInOutcome> {
        self.submit_check_in(secret, session_id, student_id, self.clock.now())
    }

    /// Scan preview: check a credential without recording anything
    pub fn verify_credential(
        &self,
        secret: &str,
        session_id: SessionId,
        student_id: &StudentId,
    ) -> Result<Verification> {
        self.validator()
            .verify(secret, session_id, student_id, self.clock.now())
    }

    /// Classified attendance for a session, ordered by student ID
    ///
    /// Covers every enrolled student plus anyone who checked in without
    /// being on the roster (possible when enrollment is not enforced).
    #[instrument(skip(self))]
    pub fn attendance_for_session(&self, session_id: SessionId) -> Result<Vec<AttendanceRecord>> {
        let retry = &self.policy.retry;
        let session = with_retry(retry, "get_session", || self.store.get_session(session_id))?
            .ok_or(Error::SessionNotFound(session_id))?;
        assert_session_invariants(&session);

        let roster = with_retry(retry, "enrolled_students", || {
            self.store.enrolled_students(session_id)
        })?;
        let mut events: HashMap<StudentId, _> = with_retry(retry, "list_events", || {
            self.store.list_events_for_session(session_id)
        })?
        .into_iter()
        .map(|e| (e.student_id.clone(), e))
        .collect();

        let mut students: BTreeMap<StudentId, _> = BTreeMap::new();
        for student_id in roster {
            let event = events.remove(&student_id);
            students.insert(student_id, event);
        }
        for (student_id, event) in events {
            students.insert(student_id, Some(event));
        }

        let now = self.clock.now();
        Ok(students
            .into_iter()
            .map(|(student_id, event)| {
                self.classifier
                    .record(&session, student_id, event.as_ref(), now)
            })
            .collect())
    }

    /// Attendance history of one student, ordered by session start
    ///
    /// Covers every session the student is enrolled in plus any session
    /// they checked in to without being on the roster.
    #[instrument(skip(self))]
    pub fn attendance_for_student(&self, student_id: &StudentId) -> Result<Vec<AttendanceRecord>> {
        let retry = &self.policy.retry;
        let enrolled = with_retry(retry, "sessions_for_student", || {
            self.store.sessions_for_student(student_id)
        })?;
        let mut events: HashMap<SessionId, _> = with_retry(retry, "list_student_events", || {
            self.store.list_events_for_student(student_id)
        })?
        .into_iter()
        .map(|e| (e.session_id, e))
        .collect();

        let mut sessions: BTreeMap<(DateTime<Utc>, SessionId), _> = BTreeMap::new();
        for session in enrolled {
            let event = events.remove(&session.id);
            sessions.insert((session.start_time, session.id), (session, event));
        }
        for (session_id, event) in events {
            match with_retry(retry, "get_session", || self.store.get_session(session_id))? {
                Some(session) => {
                    sessions.insert((session.start_time, session.id), (session, Some(event)));
                }
                None => warn!(%session_id, "Check-in refers to an unknown session"),
            }
        }

        let now = self.clock.now();
        Ok(sessions
            .into_values()
            .map(|(session, event)| {
                assert_session_invariants(&session);
                self.classifier
                    .record(&session, student_id.clone(), event.as_ref(), now)
            })
            .collect())
    }

    /// Credentials of a session that would still be accepted now
    pub fn active_credentials(&self, session_id: SessionId) -> Result<Vec<Credential>> {
        let now = self.clock.now();
        let credentials = with_retry(&self.policy.retry, "list_credentials", || {
            self.store.list_credentials_for_session(session_id)
        })?;
        Ok(credentials.into_iter().filter(|c| c.is_active(now)).collect())
    }

    /// Invalidate every credential of a session
    pub fn revoke_credentials(&self, session_id: SessionId) -> Result<u64> {
        let revoked = with_retry(&self.policy.retry, "revoke_credentials", || {
            self.store.revoke_credentials_for_session(session_id, None)
        })?;
        info!(%session_id, revoked, "Revoked session credentials");
        Ok(revoked)
    }

    /// Drop credentials whose validity window has closed
    pub fn prune_expired_credentials(&self) -> Result<u64> {
        let now = self.clock.now();
        let pruned = with_retry(&self.policy.retry, "prune_credentials", || {
            self.store.prune_expired_credentials(now)
        })?;
        if pruned > 0 {
            info!(pruned, "Pruned expired credentials");
        }
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::{AttendanceStatus, CheckInEvent, Classification, RejectReason, Session};
    use crate::storage::{CredentialIndex, EventStore, MemoryStore, SessionLookup};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use uuid::Uuid;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn student(id: &str) -> StudentId {
        StudentId::parse(id).unwrap()
    }

    fn setup(policy: PolicyConfig) -> (AttendanceService<MemoryStore>, Arc<ManualClock>, Session) {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new(at(9, 0), at(10, 0)).unwrap().with_grace_minutes(5);
        store.add_session(session.clone()).unwrap();
        for id in ["S-3", "S-1", "S-2"] {
            store.enroll(session.id, student(id)).unwrap();
        }
        let clock = Arc::new(ManualClock::new(at(9, 0)));
        let service = AttendanceService::new(store, clock.clone(), policy).unwrap();
        (service, clock, session)
    }

    #[test]
    fn test_rejects_invalid_policy() {
        let policy = PolicyConfig {
            max_validity_minutes: 0,
            ..PolicyConfig::default()
        };
        let result = AttendanceService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::new(at(9, 0))),
            policy,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_issue_then_check_in() {
        let (service, clock, session) = setup(PolicyConfig::default());
        let credential = service.issue_credential(session.id, 10).unwrap();
        assert_eq!(credential.expires_at, at(9, 10));

        clock.set(at(9, 3));
        let outcome = service
            .submit_check_in_now(credential.secret.expose_secret(), session.id, &student("S-1"))
            .unwrap();
        assert_eq!(outcome.check_in_time(), Some(at(9, 3)));
    }

    #[test]
    fn test_out_of_range_validity() {
        let (service, _, session) = setup(PolicyConfig::default());
        assert!(matches!(
            service.issue_credential(session.id, i64::MAX),
            Err(Error::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_concurrent_duplicate_scans() {
        let (service, clock, session) = setup(PolicyConfig::default());
        let credential = service.issue_credential(session.id, 10).unwrap();
        clock.set(at(9, 1));

        let barrier = Barrier::new(10);
        let accepted_a = AtomicU32::new(0);
        let duplicate_a = AtomicU32::new(0);
        let accepted_b = AtomicU32::new(0);

        thread::scope(|s| {
            for i in 0..10 {
                let (service, barrier, credential) = (&service, &barrier, &credential);
                let (accepted_a, duplicate_a, accepted_b) = (&accepted_a, &duplicate_a, &accepted_b);
                s.spawn(move || {
                    let who = if i < 8 { student("S-1") } else { student("S-2") };
                    barrier.wait();
                    let outcome = service
                        .submit_check_in_now(credential.secret.expose_secret(), session.id, &who)
                        .unwrap();
                    match (who.as_str(), outcome.reason()) {
                        ("S-1", None) => accepted_a.fetch_add(1, Ordering::SeqCst),
                        ("S-1", Some(RejectReason::AlreadyCheckedIn)) => {
                            duplicate_a.fetch_add(1, Ordering::SeqCst)
                        }
                        ("S-2", None) => accepted_b.fetch_add(1, Ordering::SeqCst),
                        ("S-2", Some(RejectReason::AlreadyCheckedIn)) => 0,
                        other => panic!("unexpected outcome {:?}", other),
                    };
                });
            }
        });

        assert_eq!(accepted_a.load(Ordering::SeqCst), 1);
        assert_eq!(duplicate_a.load(Ordering::SeqCst), 7);
        assert_eq!(accepted_b.load(Ordering::SeqCst), 1);
        assert_eq!(service.store().list_events_for_session(session.id).unwrap().len(), 2);
    }

    #[test]
    fn test_attendance_report_ordering_and_pending() {
        let (service, clock, session) = setup(PolicyConfig::default());
        let credential = service.issue_credential(session.id, 30).unwrap();
        let secret = credential.secret.expose_secret();

        clock.set(at(9, 3));
        service.submit_check_in_now(secret, session.id, &student("S-2")).unwrap();
        clock.set(at(9, 10));
        service.submit_check_in_now(secret, session.id, &student("S-3")).unwrap();

        let records = service.attendance_for_session(session.id).unwrap();
        let summary: Vec<_> = records
            .iter()
            .map(|r| (r.student_id.as_str(), r.classification.label()))
            .collect();
        assert_eq!(
            summary,
            vec![("S-1", "PENDING"), ("S-2", "PRESENT"), ("S-3", "LATE")]
        );

        clock.set(at(10, 0));
        let records = service.attendance_for_session(session.id).unwrap();
        assert_eq!(
            records[0].classification,
            Classification::Final(AttendanceStatus::Absent)
        );
        assert_eq!(records[0].check_in_time, None);
        assert_eq!(records[1].check_in_time, Some(at(9, 3)));

        // Recomputing gives the same answer
        assert_eq!(service.attendance_for_session(session.id).unwrap(), records);
    }

    #[test]
    fn test_report_includes_unrostered_check_ins() {
        let policy = PolicyConfig {
            enforce_enrollment: false,
            ..PolicyConfig::default()
        };
        let (service, clock, session) = setup(policy);
        let credential = service.issue_credential(session.id, 10).unwrap();
        clock.set(at(9, 2));
        service
            .submit_check_in_now(credential.secret.expose_secret(), session.id, &student("S-0"))
            .unwrap();

        let ids: Vec<_> = service
            .attendance_for_session(session.id)
            .unwrap()
            .into_iter()
            .map(|r| r.student_id.to_string())
            .collect();
        assert_eq!(ids, vec!["S-0", "S-1", "S-2", "S-3"]);
    }

    #[test]
    fn test_unknown_session_report() {
        let (service, _, _) = setup(PolicyConfig::default());
        assert!(matches!(
            service.attendance_for_session(SessionId::new()),
            Err(Error::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_two_tokens_both_accept_by_default() {
        let (service, clock, session) = setup(PolicyConfig::default());
        let first = service.issue_credential(session.id, 10).unwrap();
        let second = service.issue_credential(session.id, 10).unwrap();
        clock.set(at(9, 1));

        assert!(service
            .submit_check_in_now(first.secret.expose_secret(), session.id, &student("S-1"))
            .unwrap()
            .is_accepted());
        assert!(service
            .submit_check_in_now(second.secret.expose_secret(), session.id, &student("S-2"))
            .unwrap()
            .is_accepted());
        assert_eq!(service.active_credentials(session.id).unwrap().len(), 2);
    }

    #[test]
    fn test_single_active_token_rejects_first() {
        let policy = PolicyConfig {
            single_active_token: true,
            ..PolicyConfig::default()
        };
        let (service, clock, session) = setup(policy);
        let first = service.issue_credential(session.id, 10).unwrap();
        let second = service.issue_credential(session.id, 10).unwrap();
        clock.set(at(9, 1));

        let outcome = service
            .submit_check_in_now(first.secret.expose_secret(), session.id, &student("S-1"))
            .unwrap();
        assert_eq!(outcome.reason(), Some(RejectReason::Revoked));
        assert!(service
            .submit_check_in_now(second.secret.expose_secret(), session.id, &student("S-2"))
            .unwrap()
            .is_accepted());

        let active = service.active_credentials(session.id).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
    }

    #[test]
    fn test_revoke_and_prune() {
        let (service, clock, session) = setup(PolicyConfig::default());
        service.issue_credential(session.id, 10).unwrap();
        service.issue_credential(session.id, 20).unwrap();

        assert_eq!(service.revoke_credentials(session.id).unwrap(), 2);
        assert!(service.active_credentials(session.id).unwrap().is_empty());

        clock.set(at(9, 15));
        assert_eq!(service.prune_expired_credentials().unwrap(), 1);
        assert_eq!(service.store().credential_count().unwrap(), 1);
    }

    /// Store whose event writes fail a fixed number of times
    ///
    /// With `commit_before_failing` the write lands before the error is
    /// reported, like a timeout after the commit.
    struct FlakyStore {
        inner: MemoryStore,
        failures_left: AtomicU32,
        commit_before_failing: bool,
    }

    impl FlakyStore {
        fn fail_next(&self) -> Result<()> {
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(Error::StoreUnavailable("timeout".into()));
            }
            Ok(())
        }
    }

    impl CredentialIndex for FlakyStore {
        fn put_credential(&self, credential: &Credential) -> Result<()> {
            self.inner.put_credential(credential)
        }
        fn get_credential(&self, secret: &str) -> Result<Option<Credential>> {
            self.inner.get_credential(secret)
        }
        fn list_credentials_for_session(&self, session_id: SessionId) -> Result<Vec<Credential>> {
            self.inner.list_credentials_for_session(session_id)
        }
        fn record_consumption(&self, credential_id: Uuid, student_id: &StudentId) -> Result<()> {
            self.inner.record_consumption(credential_id, student_id)
        }
        fn revoke_credentials_for_session(&self, session_id: SessionId, keep: Option<Uuid>) -> Result<u64> {
            self.inner.revoke_credentials_for_session(session_id, keep)
        }
        fn prune_expired_credentials(&self, now: DateTime<Utc>) -> Result<u64> {
            self.inner.prune_expired_credentials(now)
        }
    }

    impl EventStore for FlakyStore {
        fn insert_event_if_absent(&self, event: &CheckInEvent) -> Result<bool> {
            if self.commit_before_failing {
                let inserted = self.inner.insert_event_if_absent(event)?;
                self.fail_next()?;
                return Ok(inserted);
            }
            self.fail_next()?;
            self.inner.insert_event_if_absent(event)
        }
        fn get_event(&self, session_id: SessionId, student_id: &StudentId) -> Result<Option<CheckInEvent>> {
            self.inner.get_event(session_id, student_id)
        }
        fn list_events_for_session(&self, session_id: SessionId) -> Result<Vec<CheckInEvent>> {
            self.inner.list_events_for_session(session_id)
        }
        fn list_events_for_student(&self, student_id: &StudentId) -> Result<Vec<CheckInEvent>> {
            self.inner.list_events_for_student(student_id)
        }
    }

    impl SessionLookup for FlakyStore {
        fn get_session(&self, session_id: SessionId) -> Result<Option<Session>> {
            self.inner.get_session(session_id)
        }
        fn enrolled_students(&self, session_id: SessionId) -> Result<Vec<StudentId>> {
            self.inner.enrolled_students(session_id)
        }
        fn is_enrolled(&self, session_id: SessionId, student_id: &StudentId) -> Result<bool> {
            self.inner.is_enrolled(session_id, student_id)
        }
        fn sessions_for_student(&self, student_id: &StudentId) -> Result<Vec<Session>> {
            self.inner.sessions_for_student(student_id)
        }
    }

    fn flaky_setup(failures: u32) -> (AttendanceService<FlakyStore>, Arc<ManualClock>, Session) {
        flaky_store_setup(failures, false)
    }

    fn flaky_store_setup(
        failures: u32,
        commit_before_failing: bool,
    ) -> (AttendanceService<FlakyStore>, Arc<ManualClock>, Session) {
        let inner = MemoryStore::new();
        let session = Session::new(at(9, 0), at(10, 0)).unwrap();
        inner.add_session(session.clone()).unwrap();
        inner.enroll(session.id, student("S-1")).unwrap();
        let store = Arc::new(FlakyStore {
            inner,
            failures_left: AtomicU32::new(failures),
            commit_before_failing,
        });
        let clock = Arc::new(ManualClock::new(at(9, 0)));
        let mut policy = PolicyConfig::default();
        policy.retry.initial_backoff_ms = 1;
        policy.retry.max_backoff_ms = 2;
        let service = AttendanceService::new(store, clock.clone(), policy).unwrap();
        (service, clock, session)
    }

    #[test]
    fn test_transient_store_failure_is_retried() {
        let (service, _, session) = flaky_setup(2);
        let credential = service.issue_credential(session.id, 10).unwrap();
        let outcome = service
            .submit_check_in_now(credential.secret.expose_secret(), session.id, &student("S-1"))
            .unwrap();
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_write_committed_before_timeout_is_accepted() {
        let (service, clock, session) = flaky_store_setup(1, true);
        let credential = service.issue_credential(session.id, 10).unwrap();
        clock.set(at(9, 2));

        let outcome = service
            .submit_check_in_now(credential.secret.expose_secret(), session.id, &student("S-1"))
            .unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(outcome.check_in_time(), Some(at(9, 2)));
        assert_eq!(
            service.store().list_events_for_session(session.id).unwrap().len(),
            1
        );

        // A genuine second scan is still a duplicate
        let again = service
            .submit_check_in_now(credential.secret.expose_secret(), session.id, &student("S-1"))
            .unwrap();
        assert_eq!(again.reason(), Some(RejectReason::AlreadyCheckedIn));
    }

    #[test]
    fn test_exhausted_store_is_a_failure_not_a_rejection() {
        let (service, _, session) = flaky_setup(10);
        let credential = service.issue_credential(session.id, 10).unwrap();
        let result =
            service.submit_check_in_now(credential.secret.expose_secret(), session.id, &student("S-1"));
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
        assert!(service
            .store()
            .get_event(session.id, &student("S-1"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_sqlite_flow_survives_reopen() {
        use crate::storage::SqliteStore;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let path = dir.path().join("rollcall.db");
        let session = Session::new(at(9, 0), at(10, 0)).unwrap().with_grace_minutes(5);
        let clock = Arc::new(ManualClock::new(at(9, 0)));

        {
            let store = Arc::new(SqliteStore::open(&path).unwrap());
            {
                let db = store.lock().unwrap();
                db.sessions().create(&session).unwrap();
                for id in ["S-1", "S-2", "S-3"] {
                    db.sessions().enroll(session.id, &student(id)).unwrap();
                }
            }
            let service =
                AttendanceService::new(store, clock.clone(), PolicyConfig::default()).unwrap();
            let credential = service.issue_credential(session.id, 30).unwrap();
            let secret = credential.secret.expose_secret();

            clock.set(at(9, 3));
            assert!(service
                .submit_check_in_now(secret, session.id, &student("S-1"))
                .unwrap()
                .is_accepted());
            clock.set(at(9, 10));
            assert!(service
                .submit_check_in_now(secret, session.id, &student("S-2"))
                .unwrap()
                .is_accepted());
            assert_eq!(
                service
                    .submit_check_in_now(secret, session.id, &student("S-2"))
                    .unwrap()
                    .reason(),
                Some(RejectReason::AlreadyCheckedIn)
            );
        }

        clock.set(at(10, 30));
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let service = AttendanceService::new(store, clock, PolicyConfig::default()).unwrap();
        let statuses: Vec<_> = service
            .attendance_for_session(session.id)
            .unwrap()
            .into_iter()
            .map(|r| (r.student_id.to_string(), r.status()))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("S-1".to_string(), Some(AttendanceStatus::Present)),
                ("S-2".to_string(), Some(AttendanceStatus::Late)),
                ("S-3".to_string(), Some(AttendanceStatus::Absent)),
            ]
        );
    }

    #[test]
    fn test_student_history_across_sessions() {
        let (service, clock, monday) = setup(PolicyConfig::default());
        let tuesday = Session::new(at(9, 0) + Duration::days(1), at(10, 0) + Duration::days(1))
            .unwrap()
            .with_grace_minutes(5);
        let store = service.store();
        store.add_session(tuesday.clone()).unwrap();
        store.enroll(tuesday.id, student("S-1")).unwrap();

        let credential = service.issue_credential(monday.id, 30).unwrap();
        clock.set(at(9, 10));
        service
            .submit_check_in_now(credential.secret.expose_secret(), monday.id, &student("S-1"))
            .unwrap();

        // Monday is over, Tuesday has not started
        clock.set(at(12, 0));
        let history = service.attendance_for_student(&student("S-1")).unwrap();
        let summary: Vec<_> = history
            .iter()
            .map(|r| (r.session_id, r.classification.label()))
            .collect();
        assert_eq!(summary, vec![(monday.id, "LATE"), (tuesday.id, "PENDING")]);
        assert_eq!(history[0].check_in_time, Some(at(9, 10)));

        clock.set(at(10, 0) + Duration::days(1));
        let history = service.attendance_for_student(&student("S-1")).unwrap();
        assert_eq!(history[1].status(), Some(AttendanceStatus::Absent));

        assert!(service
            .attendance_for_student(&student("S-9"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_student_history_includes_unrostered_check_in() {
        let policy = PolicyConfig {
            enforce_enrollment: false,
            ..PolicyConfig::default()
        };
        let (service, clock, session) = setup(policy);
        let credential = service.issue_credential(session.id, 10).unwrap();
        clock.set(at(9, 1));
        service
            .submit_check_in_now(credential.secret.expose_secret(), session.id, &student("S-0"))
            .unwrap();

        let history = service.attendance_for_student(&student("S-0")).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].session_id, session.id);
        assert_eq!(history[0].status(), Some(AttendanceStatus::Present));
    }
}
