use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    Conducted,
    Cancelled,
}

impl SessionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Conducted => "Conducted",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// A scheduled class meeting, as produced by schedule ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub subject_id: SubjectId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: SessionStatus,
}

impl Session {
    /// Wall-clock instant at which the session concludes.
    pub fn ends_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end_time)
    }

    /// Whether presence marks on this session count toward attendance.
    pub fn is_attendable(&self) -> bool {
        self.status != SessionStatus::Cancelled
    }
}

/// Presence mark for one student on one session. A missing record means "not marked".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub session_id: SessionId,
    pub student_id: StudentId,
    pub present: bool,
}

/// Subject metadata and attendance policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectPolicy {
    pub subject_id: SubjectId,
    pub name: String,
    pub code: String,
    pub total_planned_classes: i64,
    #[serde(default)]
    pub minimum_attendance_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: StudentId,
    pub subject_id: SubjectId,
}

/// Raw counts as reported by the store. Signed so that corrupt rows surface as violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionCounts {
    pub conducted: i64,
    pub attended: i64,
}

/// One conducted session in a student's chronological history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub subject_id: SubjectId,
    pub present: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StudentProfile {
    pub has_been_in_danger: bool,
    pub used_simulator: bool,
}

/// Catalog row describing a badge, without its unlock rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub code: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub student_id: StudentId,
    pub code: String,
    pub awarded_at: NaiveDateTime,
}
