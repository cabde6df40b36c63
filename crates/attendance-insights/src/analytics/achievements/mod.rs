mod catalog;
mod rules;

pub use catalog::{
    standard_catalog, CatalogEntry, ATTENDANCE_STRATEGIST, COMEBACK_KID, CONSISTENCY_CHAMP,
    MOMENTUM_BUILDER, PERFECT_START, SAFE_ZONE_MASTER, SEMESTER_SURVIVOR, ZERO_MISS_HERO,
};
pub use rules::{BadgeRule, RuleOutcome};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::domain::{BadgeAward, BadgeDefinition, HistoryEntry, StudentProfile};
use super::overview::Overview;

/// Everything a badge rule may look at for one student.
#[derive(Debug, Clone, Copy)]
pub struct AchievementInputs<'a> {
    pub overview: &'a Overview,
    pub momentum: u32,
    pub history: &'a [HistoryEntry],
    pub profile: StudentProfile,
    pub today: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeEvaluation {
    pub code: String,
    pub outcome: RuleOutcome,
}

/// Stateless evaluator holding the rule attached to each badge code.
#[derive(Debug, Clone)]
pub struct AchievementEngine {
    rules: Vec<(String, BadgeRule)>,
}

impl AchievementEngine {
    pub fn new(rules: Vec<(String, BadgeRule)>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(
            standard_catalog()
                .into_iter()
                .map(|entry| (entry.definition.code, entry.rule))
                .collect(),
        )
    }

    pub fn rule_for(&self, code: &str) -> Option<&BadgeRule> {
        self.rules
            .iter()
            .find(|(candidate, _)| candidate == code)
            .map(|(_, rule)| rule)
    }

    /// Evaluates every rule. Unlock state is not considered here.
    pub fn evaluate(&self, inputs: &AchievementInputs<'_>) -> Vec<BadgeEvaluation> {
        self.rules
            .iter()
            .map(|(code, rule)| BadgeEvaluation {
                code: code.clone(),
                outcome: rule.evaluate(inputs),
            })
            .collect()
    }
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// A catalog badge merged with the student's award and current progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeStatus {
    pub code: String,
    pub name: String,
    pub description: String,
    pub is_unlocked: bool,
    pub awarded_at: Option<NaiveDateTime>,
    pub progress: String,
}

/// Joins catalog, awards, and evaluations. Unlocked badges come first; the sort is
/// stable so catalog order holds within each group.
pub fn merge_badges(
    catalog: &[BadgeDefinition],
    awards: &[BadgeAward],
    evaluations: &[BadgeEvaluation],
) -> Vec<BadgeStatus> {
    let awarded: HashMap<&str, &BadgeAward> = awards
        .iter()
        .map(|award| (award.code.as_str(), award))
        .collect();
    let progress: HashMap<&str, &str> = evaluations
        .iter()
        .map(|evaluation| (evaluation.code.as_str(), evaluation.outcome.progress.as_str()))
        .collect();

    let mut badges: Vec<BadgeStatus> = catalog
        .iter()
        .map(|definition| {
            let award = awarded.get(definition.code.as_str());
            BadgeStatus {
                code: definition.code.clone(),
                name: definition.name.clone(),
                description: definition.description.clone(),
                is_unlocked: award.is_some(),
                awarded_at: award.map(|award| award.awarded_at),
                progress: progress
                    .get(definition.code.as_str())
                    .map(|text| text.to_string())
                    .unwrap_or_default(),
            }
        })
        .collect();

    badges.sort_by_key(|badge| !badge.is_unlocked);
    badges
}
