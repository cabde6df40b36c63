use super::rules::BadgeRule;
use crate::analytics::domain::BadgeDefinition;

pub const PERFECT_START: &str = "PERFECT_START";
pub const CONSISTENCY_CHAMP: &str = "CONSISTENCY_CHAMP";
pub const SAFE_ZONE_MASTER: &str = "SAFE_ZONE_MASTER";
pub const COMEBACK_KID: &str = "COMEBACK_KID";
pub const ATTENDANCE_STRATEGIST: &str = "ATTENDANCE_STRATEGIST";
pub const ZERO_MISS_HERO: &str = "ZERO_MISS_HERO";
pub const MOMENTUM_BUILDER: &str = "MOMENTUM_BUILDER";
pub const SEMESTER_SURVIVOR: &str = "SEMESTER_SURVIVOR";

/// A badge definition paired with the rule that unlocks it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub definition: BadgeDefinition,
    pub rule: BadgeRule,
}

fn entry(code: &str, name: &str, description: &str, rule: BadgeRule) -> CatalogEntry {
    CatalogEntry {
        definition: BadgeDefinition {
            code: code.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        },
        rule,
    }
}

/// The eight badges shipped with the dashboard, in display order.
pub fn standard_catalog() -> Vec<CatalogEntry> {
    vec![
        entry(
            PERFECT_START,
            "Perfect Start",
            "Attended each of your first three classes.",
            BadgeRule::FirstClassesPresent { count: 3 },
        ),
        entry(
            CONSISTENCY_CHAMP,
            "Consistency Champ",
            "Kept a 14 day class streak going.",
            BadgeRule::MomentumAtLeast { days: 14 },
        ),
        entry(
            SAFE_ZONE_MASTER,
            "Safe Zone Master",
            "Stayed above the minimum in three or more subjects at once.",
            BadgeRule::AllSafeAcross { min_subjects: 3 },
        ),
        entry(
            COMEBACK_KID,
            "Comeback Kid",
            "Climbed out of the danger zone in every subject.",
            BadgeRule::RecoveredFromDanger,
        ),
        entry(
            ATTENDANCE_STRATEGIST,
            "Attendance Strategist",
            "Used the simulator to plan ahead while staying safe.",
            BadgeRule::SimulatorWhileSafe,
        ),
        entry(
            ZERO_MISS_HERO,
            "Zero Miss Hero",
            "Made it to five or more classes this week without missing one.",
            BadgeRule::RecentWindowWithoutAbsence {
                window_days: 7,
                min_entries: 5,
            },
        ),
        entry(
            MOMENTUM_BUILDER,
            "Momentum Builder",
            "Kept a 5 day class streak going.",
            BadgeRule::MomentumAtLeast { days: 5 },
        ),
        entry(
            SEMESTER_SURVIVOR,
            "Semester Survivor",
            "Finished over 90% of the semester with every subject safe.",
            BadgeRule::SemesterProgress { min_ratio: 0.9 },
        ),
    ]
}
