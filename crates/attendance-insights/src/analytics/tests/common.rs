use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::analytics::domain::{
    AttendanceRecord, BadgeAward, BadgeDefinition, HistoryEntry, Session, SessionCounts,
    SessionId, SessionStatus, StudentId, StudentProfile, SubjectId, SubjectPolicy,
};
use crate::analytics::memory::InMemoryAttendanceStore;
use crate::analytics::repository::{AttendanceStore, BadgeStore, InsightEvents, StoreError};
use crate::analytics::stats::SubjectStats;
use crate::analytics::{AttendanceInsightsService, InsightsConfig};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).expect("valid date")
}

/// Evening of `today`, after every fixture session has ended.
pub(super) fn evening() -> NaiveDateTime {
    today().and_hms_opt(18, 0, 0).expect("valid time")
}

pub(super) fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

pub(super) fn student() -> StudentId {
    StudentId("stu-001".to_string())
}

pub(super) fn subject_id(code: &str) -> SubjectId {
    SubjectId(code.to_lowercase())
}

pub(super) fn policy(code: &str, total_planned: i64, minimum: Option<f64>) -> SubjectPolicy {
    SubjectPolicy {
        subject_id: subject_id(code),
        name: format!("{code} Lecture"),
        code: code.to_string(),
        total_planned_classes: total_planned,
        minimum_attendance_percent: minimum,
    }
}

pub(super) fn counts(conducted: i64, attended: i64) -> SessionCounts {
    SessionCounts {
        conducted,
        attended,
    }
}

pub(super) fn stats(code: &str, total_planned: i64, conducted: i64, attended: i64) -> SubjectStats {
    SubjectStats::compute(
        &policy(code, total_planned, Some(75.0)),
        counts(conducted, attended),
        75.0,
    )
    .expect("valid stats")
}

pub(super) fn entry(date: NaiveDate, present: Option<bool>) -> HistoryEntry {
    HistoryEntry {
        date,
        start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        subject_id: subject_id("MTH101"),
        present,
    }
}

/// Adds a 09:00-10:00 session for `code` on `date` and marks the student when `present` is set.
pub(super) fn seed_session(
    store: &InMemoryAttendanceStore,
    code: &str,
    date: NaiveDate,
    present: Option<bool>,
) {
    let id = SessionId(format!("{}-{date}", code.to_lowercase()));
    store
        .add_session(Session {
            id: id.clone(),
            subject_id: subject_id(code),
            date,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
            status: SessionStatus::Conducted,
        })
        .expect("session stored");
    if let Some(present) = present {
        store
            .mark_attendance(AttendanceRecord {
                session_id: id,
                student_id: student(),
                present,
            })
            .expect("attendance stored");
    }
}

pub(super) fn enroll(store: &InMemoryAttendanceStore, code: &str, total_planned: i64) {
    store
        .upsert_subject(policy(code, total_planned, None))
        .expect("subject stored");
    store
        .enroll(&student(), &subject_id(code))
        .expect("enrollment stored");
}

pub(super) type MemoryService =
    AttendanceInsightsService<InMemoryAttendanceStore, InMemoryAttendanceStore, RecordingEvents>;

pub(super) fn build_service() -> (MemoryService, InMemoryAttendanceStore, Arc<RecordingEvents>) {
    let store = InMemoryAttendanceStore::default();
    let events = Arc::new(RecordingEvents::default());
    let shared = Arc::new(store.clone());
    let service = AttendanceInsightsService::with_events(
        shared.clone(),
        shared,
        events.clone(),
        InsightsConfig::default(),
    );
    (service, store, events)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RecordedEvent {
    SubjectSkipped(SubjectId),
    DangerFlagged(Vec<String>),
    BadgeAwarded(String),
    BadgesUnavailable(String),
}

#[derive(Default)]
pub(super) struct RecordingEvents {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEvents {
    pub(super) fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().expect("events mutex poisoned").clone()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.lock().expect("events mutex poisoned").push(event);
    }
}

impl InsightEvents for RecordingEvents {
    fn subject_skipped(&self, _student: &StudentId, subject: &SubjectId, _reason: &str) {
        self.push(RecordedEvent::SubjectSkipped(subject.clone()));
    }

    fn danger_flagged(&self, _student: &StudentId, danger_subjects: &[String]) {
        self.push(RecordedEvent::DangerFlagged(danger_subjects.to_vec()));
    }

    fn badge_awarded(&self, award: &BadgeAward) {
        self.push(RecordedEvent::BadgeAwarded(award.code.clone()));
    }

    fn badges_unavailable(&self, _student: &StudentId, reason: &str) {
        self.push(RecordedEvent::BadgesUnavailable(reason.to_string()));
    }
}

fn offline() -> StoreError {
    StoreError::Unavailable("database offline".to_string())
}

pub(super) struct UnavailableStore;

impl AttendanceStore for UnavailableStore {
    fn enrolled_subjects(&self, _student: &StudentId) -> Result<Vec<SubjectPolicy>, StoreError> {
        Err(offline())
    }

    fn subject_policy(&self, _subject: &SubjectId) -> Result<Option<SubjectPolicy>, StoreError> {
        Err(offline())
    }

    fn session_counts(
        &self,
        _student: &StudentId,
        _subject: &SubjectId,
        _now: NaiveDateTime,
    ) -> Result<SessionCounts, StoreError> {
        Err(offline())
    }

    fn session_history(
        &self,
        _student: &StudentId,
        _now: NaiveDateTime,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        Err(offline())
    }

    fn conducted_dates(
        &self,
        _student: &StudentId,
        _now: NaiveDateTime,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        Err(offline())
    }

    fn student_profile(&self, _student: &StudentId) -> Result<StudentProfile, StoreError> {
        Err(offline())
    }

    fn mark_has_been_in_danger(&self, _student: &StudentId) -> Result<(), StoreError> {
        Err(offline())
    }
}

impl BadgeStore for UnavailableStore {
    fn badge_catalog(&self) -> Result<Vec<BadgeDefinition>, StoreError> {
        Err(offline())
    }

    fn awarded_badges(&self, _student: &StudentId) -> Result<Vec<BadgeAward>, StoreError> {
        Err(offline())
    }

    fn award_badge(
        &self,
        _student: &StudentId,
        _code: &str,
        _awarded_at: NaiveDateTime,
    ) -> Result<BadgeAward, StoreError> {
        Err(offline())
    }
}

/// Attendance store reporting more attended than conducted sessions for one subject.
pub(super) struct CorruptCountsStore {
    pub(super) inner: InMemoryAttendanceStore,
    pub(super) corrupt: SubjectId,
}

impl AttendanceStore for CorruptCountsStore {
    fn enrolled_subjects(&self, student: &StudentId) -> Result<Vec<SubjectPolicy>, StoreError> {
        self.inner.enrolled_subjects(student)
    }

    fn subject_policy(&self, subject: &SubjectId) -> Result<Option<SubjectPolicy>, StoreError> {
        self.inner.subject_policy(subject)
    }

    fn session_counts(
        &self,
        student: &StudentId,
        subject: &SubjectId,
        now: NaiveDateTime,
    ) -> Result<SessionCounts, StoreError> {
        if subject == &self.corrupt {
            return Ok(counts(2, 5));
        }
        self.inner.session_counts(student, subject, now)
    }

    fn session_history(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        self.inner.session_history(student, now)
    }

    fn conducted_dates(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        self.inner.conducted_dates(student, now)
    }

    fn student_profile(&self, student: &StudentId) -> Result<StudentProfile, StoreError> {
        self.inner.student_profile(student)
    }

    fn mark_has_been_in_danger(&self, student: &StudentId) -> Result<(), StoreError> {
        self.inner.mark_has_been_in_danger(student)
    }
}
