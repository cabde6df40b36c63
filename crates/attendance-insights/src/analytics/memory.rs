use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, NaiveDateTime};

use super::achievements::standard_catalog;
use super::conduct::{is_conducted, presence_for, tally_sessions};
use super::domain::{
    AttendanceRecord, BadgeAward, BadgeDefinition, Enrollment, HistoryEntry, Session,
    SessionCounts, StudentId, StudentProfile, SubjectId, SubjectPolicy,
};
use super::repository::{AttendanceStore, BadgeStore, StoreError};

#[derive(Debug, Default)]
struct StoreState {
    subjects: BTreeMap<SubjectId, SubjectPolicy>,
    enrollments: Vec<Enrollment>,
    sessions: Vec<Session>,
    attendance: Vec<AttendanceRecord>,
    profiles: HashMap<StudentId, StudentProfile>,
    catalog: Vec<BadgeDefinition>,
    awards: BTreeMap<(StudentId, String), BadgeAward>,
}

/// Process-local store backing both collaborator traits from raw rows.
#[derive(Debug, Clone)]
pub struct InMemoryAttendanceStore {
    state: Arc<Mutex<StoreState>>,
}

impl Default for InMemoryAttendanceStore {
    fn default() -> Self {
        let state = StoreState {
            catalog: standard_catalog()
                .into_iter()
                .map(|entry| entry.definition)
                .collect(),
            ..StoreState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

impl InMemoryAttendanceStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn upsert_subject(&self, policy: SubjectPolicy) -> Result<(), StoreError> {
        self.lock()?.subjects.insert(policy.subject_id.clone(), policy);
        Ok(())
    }

    pub fn remove_subject(&self, subject: &SubjectId) -> Result<(), StoreError> {
        self.lock()?.subjects.remove(subject);
        Ok(())
    }

    pub fn enroll(&self, student: &StudentId, subject: &SubjectId) -> Result<(), StoreError> {
        let enrollment = Enrollment {
            student_id: student.clone(),
            subject_id: subject.clone(),
        };
        let mut state = self.lock()?;
        if !state.enrollments.contains(&enrollment) {
            state.enrollments.push(enrollment);
        }
        Ok(())
    }

    pub fn add_session(&self, session: Session) -> Result<(), StoreError> {
        self.lock()?.sessions.push(session);
        Ok(())
    }

    /// Records or replaces a presence mark.
    pub fn mark_attendance(&self, record: AttendanceRecord) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.attendance.retain(|existing| {
            existing.session_id != record.session_id || existing.student_id != record.student_id
        });
        state.attendance.push(record);
        Ok(())
    }

    pub fn mark_used_simulator(&self, student: &StudentId) -> Result<(), StoreError> {
        self.lock()?
            .profiles
            .entry(student.clone())
            .or_default()
            .used_simulator = true;
        Ok(())
    }

    pub fn set_catalog(&self, catalog: Vec<BadgeDefinition>) -> Result<(), StoreError> {
        self.lock()?.catalog = catalog;
        Ok(())
    }
}

impl StoreState {
    fn enrolled_ids(&self, student: &StudentId) -> BTreeSet<&SubjectId> {
        self.enrollments
            .iter()
            .filter(|enrollment| &enrollment.student_id == student)
            .map(|enrollment| &enrollment.subject_id)
            .collect()
    }

    fn marks_for(&self, student: &StudentId) -> Vec<AttendanceRecord> {
        self.attendance
            .iter()
            .filter(|record| &record.student_id == student)
            .cloned()
            .collect()
    }

    fn conducted_for<'a>(
        &'a self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> impl Iterator<Item = &'a Session> + 'a {
        let enrolled: BTreeSet<SubjectId> =
            self.enrolled_ids(student).into_iter().cloned().collect();
        self.sessions
            .iter()
            .filter(move |session| enrolled.contains(&session.subject_id))
            .filter(move |session| is_conducted(session, now))
    }
}

impl AttendanceStore for InMemoryAttendanceStore {
    fn enrolled_subjects(&self, student: &StudentId) -> Result<Vec<SubjectPolicy>, StoreError> {
        let state = self.lock()?;
        let mut policies = Vec::new();
        for subject in state.enrolled_ids(student) {
            match state.subjects.get(subject) {
                Some(policy) => policies.push(policy.clone()),
                // Dangling enrollment; keep the id so the caller can report it.
                None => policies.push(SubjectPolicy {
                    subject_id: subject.clone(),
                    name: subject.0.clone(),
                    code: subject.0.clone(),
                    total_planned_classes: 0,
                    minimum_attendance_percent: None,
                }),
            }
        }
        Ok(policies)
    }

    fn subject_policy(&self, subject: &SubjectId) -> Result<Option<SubjectPolicy>, StoreError> {
        Ok(self.lock()?.subjects.get(subject).cloned())
    }

    fn session_counts(
        &self,
        student: &StudentId,
        subject: &SubjectId,
        now: NaiveDateTime,
    ) -> Result<SessionCounts, StoreError> {
        let state = self.lock()?;
        if !state.subjects.contains_key(subject) {
            return Err(StoreError::NotFound(format!("subject {subject}")));
        }
        let marks = state.marks_for(student);
        let sessions = state
            .sessions
            .iter()
            .filter(|session| &session.subject_id == subject);
        Ok(tally_sessions(sessions, &marks, now))
    }

    fn session_history(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let state = self.lock()?;
        let marks = state.marks_for(student);
        let mut history: Vec<HistoryEntry> = state
            .conducted_for(student, now)
            .map(|session| HistoryEntry {
                date: session.date,
                start_time: session.start_time,
                subject_id: session.subject_id.clone(),
                present: presence_for(session, &marks),
            })
            .collect();
        history.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        Ok(history)
    }

    fn conducted_dates(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveDate>, StoreError> {
        let state = self.lock()?;
        let dates: BTreeSet<NaiveDate> = state
            .conducted_for(student, now)
            .map(|session| session.date)
            .collect();
        Ok(dates.into_iter().rev().collect())
    }

    fn student_profile(&self, student: &StudentId) -> Result<StudentProfile, StoreError> {
        Ok(self
            .lock()?
            .profiles
            .get(student)
            .copied()
            .unwrap_or_default())
    }

    fn mark_has_been_in_danger(&self, student: &StudentId) -> Result<(), StoreError> {
        self.lock()?
            .profiles
            .entry(student.clone())
            .or_default()
            .has_been_in_danger = true;
        Ok(())
    }
}

impl BadgeStore for InMemoryAttendanceStore {
    fn badge_catalog(&self) -> Result<Vec<BadgeDefinition>, StoreError> {
        Ok(self.lock()?.catalog.clone())
    }

    fn awarded_badges(&self, student: &StudentId) -> Result<Vec<BadgeAward>, StoreError> {
        Ok(self
            .lock()?
            .awards
            .values()
            .filter(|award| &award.student_id == student)
            .cloned()
            .collect())
    }

    fn award_badge(
        &self,
        student: &StudentId,
        code: &str,
        awarded_at: NaiveDateTime,
    ) -> Result<BadgeAward, StoreError> {
        let mut state = self.lock()?;
        let award = state
            .awards
            .entry((student.clone(), code.to_string()))
            .or_insert_with(|| BadgeAward {
                student_id: student.clone(),
                code: code.to_string(),
                awarded_at,
            });
        Ok(award.clone())
    }
}
