use serde::{Deserialize, Serialize};

use super::domain::{SessionCounts, SubjectId, SubjectPolicy};
use super::service::InsightsError;

/// Percentage points above the minimum needed before a subject is considered low risk.
const LOW_RISK_MARGIN: f64 = 3.0;
const HIGH_CONFIDENCE_PROGRESS: f64 = 20.0;
const MODERATE_CONFIDENCE_PROGRESS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn classify(percentage: f64, minimum_percent: f64) -> Self {
        if percentage >= minimum_percent + LOW_RISK_MARGIN {
            Self::Low
        } else if percentage < minimum_percent {
            Self::High
        } else {
            Self::Moderate
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

impl Confidence {
    /// With no conducted sessions the figure is reported as `High` ("awaiting data").
    pub fn assess(conducted: i64, total_planned: i64) -> Self {
        if conducted == 0 {
            return Self::High;
        }
        let progress = if total_planned > 0 {
            conducted as f64 / total_planned as f64 * 100.0
        } else {
            100.0
        };
        if progress >= HIGH_CONFIDENCE_PROGRESS {
            Self::High
        } else if progress >= MODERATE_CONFIDENCE_PROGRESS {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Moderate => "MODERATE",
            Self::Low => "LOW",
        }
    }
}

/// Risk and prediction record for one (student, subject) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub subject_code: String,
    pub total_planned: i64,
    pub min_pct: f64,
    pub conducted: i64,
    pub attended: i64,
    pub percentage: f64,
    pub max_allowed_absent: i64,
    pub absent_so_far: i64,
    pub absent_left: i64,
    pub percent_if_attend: f64,
    pub percent_if_miss: f64,
    pub risk_level: RiskLevel,
    pub is_safe: bool,
    pub safe_miss_message: String,
    pub confidence: Confidence,
}

impl SubjectStats {
    pub fn compute(
        policy: &SubjectPolicy,
        counts: SessionCounts,
        default_minimum_percent: f64,
    ) -> Result<Self, InsightsError> {
        let min_pct = policy
            .minimum_attendance_percent
            .unwrap_or(default_minimum_percent);
        validate(policy, counts, min_pct)?;

        let SessionCounts {
            conducted,
            attended,
        } = counts;
        let total_planned = policy.total_planned_classes;

        let percentage = if conducted == 0 {
            0.0
        } else {
            round2(attended as f64 / conducted as f64 * 100.0)
        };
        let max_allowed_absent = (total_planned as f64 * (1.0 - min_pct / 100.0)).floor() as i64;
        let absent_so_far = conducted - attended;
        let absent_left = (max_allowed_absent - absent_so_far).max(0);

        let next_conducted = conducted.checked_add(1).ok_or_else(|| {
            InsightsError::InvariantViolation(format!(
                "subject {} reports {conducted} conducted sessions",
                policy.subject_id
            ))
        })?;
        let percent_if_attend = round2((attended + 1) as f64 / next_conducted as f64 * 100.0);
        let percent_if_miss = round2(attended as f64 / next_conducted as f64 * 100.0);

        let safe_miss_message = if absent_left > 0 {
            format!("You can miss {absent_left} more classes safely")
        } else {
            let over = (absent_so_far - max_allowed_absent).max(0);
            format!("You cannot miss any more classes. You are {over} classes over the limit")
        };

        Ok(Self {
            subject_id: policy.subject_id.clone(),
            subject_name: policy.name.clone(),
            subject_code: policy.code.clone(),
            total_planned,
            min_pct,
            conducted,
            attended,
            percentage,
            max_allowed_absent,
            absent_so_far,
            absent_left,
            percent_if_attend,
            percent_if_miss,
            risk_level: RiskLevel::classify(percentage, min_pct),
            is_safe: percentage >= min_pct,
            safe_miss_message,
            confidence: Confidence::assess(conducted, total_planned),
        })
    }
}

fn validate(
    policy: &SubjectPolicy,
    counts: SessionCounts,
    min_pct: f64,
) -> Result<(), InsightsError> {
    if counts.conducted < 0 || counts.attended < 0 {
        return Err(InsightsError::InvariantViolation(format!(
            "negative session counts for subject {} (conducted {}, attended {})",
            policy.subject_id, counts.conducted, counts.attended
        )));
    }
    if counts.attended > counts.conducted {
        return Err(InsightsError::InvariantViolation(format!(
            "subject {} reports {} attended out of {} conducted sessions",
            policy.subject_id, counts.attended, counts.conducted
        )));
    }
    if policy.total_planned_classes < 0 {
        return Err(InsightsError::InvariantViolation(format!(
            "subject {} plans {} classes",
            policy.subject_id, policy.total_planned_classes
        )));
    }
    if !(0.0..=100.0).contains(&min_pct) {
        return Err(InsightsError::InvariantViolation(format!(
            "subject {} minimum attendance {min_pct} is outside 0..=100",
            policy.subject_id
        )));
    }
    Ok(())
}

/// Upcoming classes to project on top of the current counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationPlan {
    #[serde(default)]
    pub attend: u32,
    #[serde(default)]
    pub miss: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub plan: SimulationPlan,
    pub current: SubjectStats,
    pub projected: SubjectStats,
    pub percentage_change: f64,
}

/// Projects a subject's stats as if the planned classes had already been conducted.
pub fn simulate(
    policy: &SubjectPolicy,
    counts: SessionCounts,
    plan: SimulationPlan,
    default_minimum_percent: f64,
) -> Result<SimulationOutcome, InsightsError> {
    let current = SubjectStats::compute(policy, counts, default_minimum_percent)?;
    let overflow = || {
        InsightsError::InvariantViolation(format!(
            "projecting {} attended and {} missed classes overflows subject {}",
            plan.attend, plan.miss, policy.subject_id
        ))
    };
    let projected_counts = SessionCounts {
        conducted: counts
            .conducted
            .checked_add(i64::from(plan.attend) + i64::from(plan.miss))
            .ok_or_else(overflow)?,
        attended: counts
            .attended
            .checked_add(i64::from(plan.attend))
            .ok_or_else(overflow)?,
    };
    let projected = SubjectStats::compute(policy, projected_counts, default_minimum_percent)?;
    let percentage_change = round2(projected.percentage - current.percentage);

    Ok(SimulationOutcome {
        plan,
        current,
        projected,
        percentage_change,
    })
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
