use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::achievements::{merge_badges, AchievementEngine, AchievementInputs, BadgeStatus};
use super::config::InsightsConfig;
use super::domain::{StudentId, SubjectId, SubjectPolicy};
use super::momentum::momentum_streak;
use super::overview::Overview;
use super::repository::{AttendanceStore, BadgeStore, InsightEvents, StoreError, TracingEvents};
use super::stats::{simulate, SimulationOutcome, SimulationPlan, SubjectStats};

/// Overview, momentum, and badges for one dashboard load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub student_id: StudentId,
    pub generated_at: NaiveDateTime,
    pub overview: Overview,
    pub momentum: u32,
    pub badges: Vec<BadgeStatus>,
}

/// Service composing the attendance store, badge store, and rule engine.
pub struct AttendanceInsightsService<S, B, E = TracingEvents> {
    attendance: Arc<S>,
    badges: Arc<B>,
    events: Arc<E>,
    engine: Arc<AchievementEngine>,
    config: InsightsConfig,
}

impl<S, B> AttendanceInsightsService<S, B, TracingEvents>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
{
    pub fn new(attendance: Arc<S>, badges: Arc<B>, config: InsightsConfig) -> Self {
        Self::with_events(attendance, badges, Arc::new(TracingEvents), config)
    }
}

impl<S, B, E> AttendanceInsightsService<S, B, E>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
    E: InsightEvents + 'static,
{
    pub fn with_events(
        attendance: Arc<S>,
        badges: Arc<B>,
        events: Arc<E>,
        config: InsightsConfig,
    ) -> Self {
        Self {
            attendance,
            badges,
            events,
            engine: Arc::new(AchievementEngine::standard()),
            config,
        }
    }

    pub fn with_engine(mut self, engine: AchievementEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    fn policy(&self, subject: &SubjectId) -> Result<SubjectPolicy, InsightsError> {
        self.attendance
            .subject_policy(subject)?
            .ok_or_else(|| InsightsError::NotFound(format!("subject {subject}")))
    }

    fn stats_for(
        &self,
        student: &StudentId,
        policy: &SubjectPolicy,
        now: NaiveDateTime,
    ) -> Result<SubjectStats, InsightsError> {
        let counts = self
            .attendance
            .session_counts(student, &policy.subject_id, now)?;
        SubjectStats::compute(policy, counts, self.config.default_minimum_percent)
    }

    /// Risk and prediction record for a single subject.
    pub fn subject_stats(
        &self,
        student: &StudentId,
        subject: &SubjectId,
        now: NaiveDateTime,
    ) -> Result<SubjectStats, InsightsError> {
        let policy = self.policy(subject)?;
        self.stats_for(student, &policy, now)
    }

    /// Stats for every enrolled subject. Subjects that are missing or report
    /// inconsistent counts are skipped; an unreachable store fails the call.
    /// Any unsafe subject sets the student's danger flag.
    pub fn overview(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Overview, InsightsError> {
        let enrolled = self.attendance.enrolled_subjects(student)?;
        let mut subjects = Vec::with_capacity(enrolled.len());

        for policy in &enrolled {
            match self.stats_for(student, policy, now) {
                Ok(stats) => subjects.push(stats),
                Err(err @ InsightsError::StoreUnavailable(_)) => return Err(err),
                Err(err) => {
                    self.events
                        .subject_skipped(student, &policy.subject_id, &err.to_string());
                }
            }
        }

        let overview = Overview::new(subjects);
        if !overview.overall_status.is_all_safe {
            self.attendance.mark_has_been_in_danger(student)?;
            self.events
                .danger_flagged(student, &overview.overall_status.danger_subjects);
        }
        Ok(overview)
    }

    pub fn momentum(&self, student: &StudentId, now: NaiveDateTime) -> Result<u32, InsightsError> {
        let dates = self.attendance.conducted_dates(student, now)?;
        Ok(momentum_streak(&dates, now.date()))
    }

    /// Badge list for the student. Evaluation failures yield an empty list.
    pub fn badges(&self, student: &StudentId, now: NaiveDateTime) -> Vec<BadgeStatus> {
        let attempt = self.overview(student, now).and_then(|overview| {
            let momentum = self.momentum(student, now)?;
            self.evaluate_badges(student, &overview, momentum, now)
        });
        self.fail_open(student, attempt)
    }

    /// Overview and momentum are required; badges degrade to an empty list.
    pub fn dashboard(
        &self,
        student: &StudentId,
        now: NaiveDateTime,
    ) -> Result<Dashboard, InsightsError> {
        let overview = self.overview(student, now)?;
        let momentum = self.momentum(student, now)?;
        let attempt = self.evaluate_badges(student, &overview, momentum, now);
        let badges = self.fail_open(student, attempt);

        Ok(Dashboard {
            student_id: student.clone(),
            generated_at: now,
            overview,
            momentum,
            badges,
        })
    }

    /// Projects a subject's stats after the planned upcoming classes.
    pub fn simulate(
        &self,
        student: &StudentId,
        subject: &SubjectId,
        plan: SimulationPlan,
        now: NaiveDateTime,
    ) -> Result<SimulationOutcome, InsightsError> {
        let policy = self.policy(subject)?;
        let counts = self.attendance.session_counts(student, subject, now)?;
        simulate(&policy, counts, plan, self.config.default_minimum_percent)
    }

    fn fail_open(
        &self,
        student: &StudentId,
        attempt: Result<Vec<BadgeStatus>, InsightsError>,
    ) -> Vec<BadgeStatus> {
        match attempt {
            Ok(badges) => badges,
            Err(err) => {
                self.events.badges_unavailable(student, &err.to_string());
                Vec::new()
            }
        }
    }

    fn evaluate_badges(
        &self,
        student: &StudentId,
        overview: &Overview,
        momentum: u32,
        now: NaiveDateTime,
    ) -> Result<Vec<BadgeStatus>, InsightsError> {
        let history = self.attendance.session_history(student, now)?;
        let profile = self.attendance.student_profile(student)?;
        let catalog = self.badges.badge_catalog()?;
        let mut awards = self.badges.awarded_badges(student)?;

        let inputs = AchievementInputs {
            overview,
            momentum,
            history: &history,
            profile,
            today: now.date(),
        };
        let evaluations = self.engine.evaluate(&inputs);

        let known: HashSet<&str> = catalog.iter().map(|badge| badge.code.as_str()).collect();
        let unlocked: HashSet<String> = awards.iter().map(|award| award.code.clone()).collect();

        for evaluation in &evaluations {
            let code = evaluation.code.as_str();
            if !evaluation.outcome.satisfied || unlocked.contains(code) || !known.contains(code) {
                continue;
            }
            let award = self.badges.award_badge(student, code, now)?;
            self.events.badge_awarded(&award);
            awards.push(award);
        }

        Ok(merge_badges(&catalog, &awards, &evaluations))
    }
}

/// Error raised by the insights service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InsightsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<StoreError> for InsightsError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
        }
    }
}
