//! Attendance risk analytics and the achievement rule engine.
//!
//! Raw session and attendance rows come from an [`AttendanceStore`]; the service derives
//! per-subject stats, rolls them into an overview, tracks momentum, and evaluates the
//! badge catalog against a [`BadgeStore`]. Everything is recomputed per request and
//! badge awards are the only state written back.

pub mod achievements;
pub mod conduct;
mod config;
pub mod domain;
pub mod memory;
pub mod momentum;
pub mod overview;
pub mod repository;
pub mod router;
pub mod service;
pub mod stats;

#[cfg(test)]
mod tests;

pub use achievements::{AchievementEngine, BadgeRule, BadgeStatus};
pub use conduct::is_conducted;
pub use config::InsightsConfig;
pub use domain::{
    AttendanceRecord, BadgeAward, BadgeDefinition, Enrollment, HistoryEntry, Session,
    SessionCounts, SessionId, SessionStatus, StudentId, StudentProfile, SubjectId, SubjectPolicy,
};
pub use memory::InMemoryAttendanceStore;
pub use momentum::momentum_streak;
pub use overview::{OverallStatus, Overview};
pub use repository::{AttendanceStore, BadgeStore, InsightEvents, StoreError, TracingEvents};
pub use router::insights_router;
pub use service::{AttendanceInsightsService, Dashboard, InsightsError};
pub use stats::{Confidence, RiskLevel, SimulationOutcome, SimulationPlan, SubjectStats};
