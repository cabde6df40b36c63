use chrono::{NaiveDate, NaiveDateTime};

use super::domain::{
    BadgeAward, BadgeDefinition, HistoryEntry, SessionCounts, StudentId, StudentProfile,
    SubjectId, SubjectPolicy,
};

/// Read access to sessions, marks, and enrollments, plus the danger flag write.
pub trait AttendanceStore: Send + Sync {
    fn enrolled_subjects(&self, student: &StudentId) -> Result<Vec<SubjectPolicy>, StoreError>;
    fn subject_policy(&self, subject: &SubjectId) -> Result<Option<SubjectPolicy>, StoreError>;
    /// Conducted sessions for the subject and how many of them the student attended.
    fn session_counts(
        &self,
        student: &StudentId,
        subject: &SubjectId,
        now: NaiveDateTime,
    ) -> Result<SessionCounts, StoreError>;
    /// Conducted sessions across enrolled subjects, ascending by date then start time.
    fn session_history(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Vec<HistoryEntry>, StoreError>;
    /// Dates with at least one conducted session across enrolled subjects.
    fn conducted_dates(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveDate>, StoreError>;
    fn student_profile(&self, student: &StudentId) -> Result<StudentProfile, StoreError>;
    /// One-way flag; calling it again must be a no-op.
    fn mark_has_been_in_danger(&self, student: &StudentId) -> Result<(), StoreError>;
}

/// Badge catalog and award persistence.
pub trait BadgeStore: Send + Sync {
    fn badge_catalog(&self) -> Result<Vec<BadgeDefinition>, StoreError>;
    fn awarded_badges(&self, student: &StudentId) -> Result<Vec<BadgeAward>, StoreError>;
    /// Insert-if-absent. Returns the stored award, which is the earlier row when one exists.
    fn award_badge(
        &self,
        student: &StudentId,
        code: &str,
        awarded_at: NaiveDateTime,
    ) -> Result<BadgeAward, StoreError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Structured notifications emitted by the insights service.
pub trait InsightEvents: Send + Sync {
    fn subject_skipped(&self, student: &StudentId, subject: &SubjectId, reason: &str);
    fn danger_flagged(&self, student: &StudentId, danger_subjects: &[String]);
    fn badge_awarded(&self, award: &BadgeAward);
    fn badges_unavailable(&self, student: &StudentId, reason: &str);
}

/// Default event sink forwarding to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl InsightEvents for TracingEvents {
    fn subject_skipped(&self, student: &StudentId, subject: &SubjectId, reason: &str) {
        tracing::warn!(%student, %subject, reason, "skipping subject in overview");
    }

    fn danger_flagged(&self, student: &StudentId, danger_subjects: &[String]) {
        tracing::info!(%student, ?danger_subjects, "student entered the danger zone");
    }

    fn badge_awarded(&self, award: &BadgeAward) {
        tracing::info!(
            student = %award.student_id,
            code = %award.code,
            awarded_at = %award.awarded_at,
            "badge unlocked"
        );
    }

    fn badges_unavailable(&self, student: &StudentId, reason: &str) {
        tracing::error!(%student, reason, "badge evaluation failed; returning no badges");
    }
}
