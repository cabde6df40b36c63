use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::AchievementInputs;

/// Declarative unlock predicate. New badges can be configured without new code
/// as long as they reuse one of these shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BadgeRule {
    /// The first `count` history entries exist and are all marked present.
    FirstClassesPresent { count: usize },
    /// Momentum streak of at least `days`.
    MomentumAtLeast { days: u32 },
    /// At least `min_subjects` subjects in the overview and every one of them safe.
    AllSafeAcross { min_subjects: usize },
    /// The student was in the danger zone at some point and is now safe everywhere.
    RecoveredFromDanger,
    /// The student used the attendance simulator and is safe everywhere.
    SimulatorWhileSafe,
    /// At least `min_entries` sessions in the last `window_days` calendar days
    /// (today included) and none marked absent.
    RecentWindowWithoutAbsence { window_days: i64, min_entries: usize },
    /// Conducted share of planned classes strictly above `min_ratio`, all subjects safe.
    SemesterProgress { min_ratio: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub satisfied: bool,
    pub progress: String,
}

impl BadgeRule {
    pub fn evaluate(&self, inputs: &AchievementInputs<'_>) -> RuleOutcome {
        let all_safe = inputs.overview.overall_status.is_all_safe;

        match *self {
            BadgeRule::FirstClassesPresent { count } => {
                let attended = inputs
                    .history
                    .iter()
                    .take(count)
                    .filter(|entry| entry.present == Some(true))
                    .count();
                RuleOutcome {
                    satisfied: inputs.history.len() >= count && attended == count,
                    progress: format!("{attended}/{count} First Classes Attended"),
                }
            }
            BadgeRule::MomentumAtLeast { days } => RuleOutcome {
                satisfied: inputs.momentum >= days,
                progress: format!("{}/{days} Days Streak", inputs.momentum.min(days)),
            },
            BadgeRule::AllSafeAcross { min_subjects } => {
                let total = inputs.overview.subjects.len();
                RuleOutcome {
                    satisfied: total >= min_subjects && all_safe,
                    progress: format!(
                        "{}/{total} Subjects Safe",
                        inputs.overview.safe_subject_count()
                    ),
                }
            }
            BadgeRule::RecoveredFromDanger => {
                let was_in_danger = inputs.profile.has_been_in_danger;
                let progress = match (was_in_danger, all_safe) {
                    (true, true) => "Recovered from the danger zone",
                    (true, false) => "Get every subject back to safe",
                    (false, _) => "Never entered the danger zone",
                };
                RuleOutcome {
                    satisfied: was_in_danger && all_safe,
                    progress: progress.to_string(),
                }
            }
            BadgeRule::SimulatorWhileSafe => {
                let used = inputs.profile.used_simulator;
                let progress = match (used, all_safe) {
                    (true, true) => "Planned ahead and stayed safe",
                    (true, false) => "Get every subject back to safe",
                    (false, _) => "Try the attendance simulator",
                };
                RuleOutcome {
                    satisfied: used && all_safe,
                    progress: progress.to_string(),
                }
            }
            BadgeRule::RecentWindowWithoutAbsence {
                window_days,
                min_entries,
            } => {
                // Windows shorter than a day or reaching past the calendar match nothing.
                let window_start = (window_days >= 1)
                    .then(|| Duration::try_days(window_days - 1))
                    .flatten()
                    .and_then(|span| inputs.today.checked_sub_signed(span));
                let recent: Vec<_> = inputs
                    .history
                    .iter()
                    .filter(|entry| {
                        window_start.is_some_and(|start| {
                            entry.date >= start && entry.date <= inputs.today
                        })
                    })
                    .collect();
                let missed = recent.iter().any(|entry| entry.present == Some(false));
                let progress = if missed {
                    "Missed a class this week".to_string()
                } else {
                    format!(
                        "{}/{min_entries} Classes This Week",
                        recent.len().min(min_entries)
                    )
                };
                RuleOutcome {
                    satisfied: recent.len() >= min_entries && !missed,
                    progress,
                }
            }
            BadgeRule::SemesterProgress { min_ratio } => {
                let ratio = inputs.overview.semester_progress();
                let completed = ratio.unwrap_or(0.0) * 100.0;
                RuleOutcome {
                    satisfied: ratio.map(|value| value > min_ratio).unwrap_or(false) && all_safe,
                    progress: format!("{completed:.0}% of Semester Completed"),
                }
            }
        }
    }
}
