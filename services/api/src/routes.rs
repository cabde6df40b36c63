use crate::infra::{AppState, InsightsState};
use attendance_insights::analytics::router::AsOf;
use attendance_insights::analytics::{
    insights_router, InsightsError, SimulationOutcome, SimulationPlan, StudentId, SubjectId,
};
use attendance_insights::error::AppError;
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;

pub(crate) fn with_insights_routes(state: InsightsState) -> axum::Router {
    insights_router(state.service.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/students/:student_id/subjects/:subject_id/simulate",
            axum::routing::post(simulate_endpoint),
        )
        .layer(Extension(state))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Runs the what-if projection and records that the student used the simulator.
pub(crate) async fn simulate_endpoint(
    Extension(state): Extension<InsightsState>,
    Path((student_id, subject_id)): Path<(String, String)>,
    Query(as_of): Query<AsOf>,
    Json(plan): Json<SimulationPlan>,
) -> Result<Json<SimulationOutcome>, AppError> {
    let student = StudentId(student_id);
    let outcome = state.service.simulate(
        &student,
        &SubjectId(subject_id),
        plan,
        as_of.resolve(),
    )?;
    state
        .store
        .mark_used_simulator(&student)
        .map_err(InsightsError::from)?;
    Ok(Json(outcome))
}
