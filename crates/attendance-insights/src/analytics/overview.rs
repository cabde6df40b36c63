use serde::{Deserialize, Serialize};

use super::stats::SubjectStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStatus {
    pub is_all_safe: bool,
    pub danger_subjects: Vec<String>,
}

impl OverallStatus {
    /// Vacuously safe when no subject produced stats.
    pub fn from_subjects(subjects: &[SubjectStats]) -> Self {
        let danger_subjects: Vec<String> = subjects
            .iter()
            .filter(|stats| !stats.is_safe)
            .map(|stats| stats.subject_name.clone())
            .collect();

        Self {
            is_all_safe: danger_subjects.is_empty(),
            danger_subjects,
        }
    }
}

/// Per-subject stats for every enrolled subject that could be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub subjects: Vec<SubjectStats>,
    pub overall_status: OverallStatus,
}

impl Overview {
    pub fn new(subjects: Vec<SubjectStats>) -> Self {
        let overall_status = OverallStatus::from_subjects(&subjects);
        Self {
            subjects,
            overall_status,
        }
    }

    pub fn safe_subject_count(&self) -> usize {
        self.subjects.iter().filter(|stats| stats.is_safe).count()
    }

    pub fn total_planned(&self) -> i64 {
        self.subjects.iter().map(|stats| stats.total_planned).sum()
    }

    pub fn total_conducted(&self) -> i64 {
        self.subjects.iter().map(|stats| stats.conducted).sum()
    }

    /// Share of the planned term already conducted, `None` when nothing is planned.
    pub fn semester_progress(&self) -> Option<f64> {
        let planned = self.total_planned();
        if planned > 0 {
            Some(self.total_conducted() as f64 / planned as f64)
        } else {
            None
        }
    }
}
