use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use serde_json::json;

use super::achievements::BadgeStatus;
use super::domain::{StudentId, SubjectId};
use super::overview::Overview;
use super::repository::{AttendanceStore, BadgeStore, InsightEvents};
use super::service::{AttendanceInsightsService, Dashboard};
use super::stats::SubjectStats;
use crate::error::AppError;

/// Optional evaluation instant; defaults to the local wall clock.
#[derive(Debug, Default, Deserialize)]
pub struct AsOf {
    #[serde(default)]
    pub now: Option<NaiveDateTime>,
}

impl AsOf {
    pub fn resolve(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }
}

type SharedService<S, B, E> = Arc<AttendanceInsightsService<S, B, E>>;

/// Router builder exposing the per-student analytics endpoints.
pub fn insights_router<S, B, E>(service: SharedService<S, B, E>) -> Router
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
    E: InsightEvents + 'static,
{
    Router::new()
        .route(
            "/api/v1/students/:student_id/subjects/:subject_id/stats",
            get(subject_stats_handler::<S, B, E>),
        )
        .route(
            "/api/v1/students/:student_id/overview",
            get(overview_handler::<S, B, E>),
        )
        .route(
            "/api/v1/students/:student_id/momentum",
            get(momentum_handler::<S, B, E>),
        )
        .route(
            "/api/v1/students/:student_id/badges",
            get(badges_handler::<S, B, E>),
        )
        .route(
            "/api/v1/students/:student_id/dashboard",
            get(dashboard_handler::<S, B, E>),
        )
        .with_state(service)
}

pub(crate) async fn subject_stats_handler<S, B, E>(
    State(service): State<SharedService<S, B, E>>,
    Path((student_id, subject_id)): Path<(String, String)>,
    Query(as_of): Query<AsOf>,
) -> Result<Json<SubjectStats>, AppError>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
    E: InsightEvents + 'static,
{
    let stats = service.subject_stats(
        &StudentId(student_id),
        &SubjectId(subject_id),
        as_of.resolve(),
    )?;
    Ok(Json(stats))
}

pub(crate) async fn overview_handler<S, B, E>(
    State(service): State<SharedService<S, B, E>>,
    Path(student_id): Path<String>,
    Query(as_of): Query<AsOf>,
) -> Result<Json<Overview>, AppError>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
    E: InsightEvents + 'static,
{
    let overview = service.overview(&StudentId(student_id), as_of.resolve())?;
    Ok(Json(overview))
}

pub(crate) async fn momentum_handler<S, B, E>(
    State(service): State<SharedService<S, B, E>>,
    Path(student_id): Path<String>,
    Query(as_of): Query<AsOf>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
    E: InsightEvents + 'static,
{
    let student = StudentId(student_id);
    let momentum = service.momentum(&student, as_of.resolve())?;
    Ok(Json(json!({
        "student_id": student,
        "momentum": momentum,
    })))
}

pub(crate) async fn badges_handler<S, B, E>(
    State(service): State<SharedService<S, B, E>>,
    Path(student_id): Path<String>,
    Query(as_of): Query<AsOf>,
) -> Json<Vec<BadgeStatus>>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
    E: InsightEvents + 'static,
{
    Json(service.badges(&StudentId(student_id), as_of.resolve()))
}

pub(crate) async fn dashboard_handler<S, B, E>(
    State(service): State<SharedService<S, B, E>>,
    Path(student_id): Path<String>,
    Query(as_of): Query<AsOf>,
) -> Result<Json<Dashboard>, AppError>
where
    S: AttendanceStore + 'static,
    B: BadgeStore + 'static,
    E: InsightEvents + 'static,
{
    let dashboard = service.dashboard(&StudentId(student_id), as_of.resolve())?;
    Ok(Json(dashboard))
}
