use crate::cli::ServeArgs;
use crate::demo::seed_demo_term;
use crate::infra::{AppState, InsightsState};
use crate::routes::with_insights_routes;
use attendance_insights::analytics::{
    AttendanceInsightsService, InMemoryAttendanceStore, InsightsError,
};
use attendance_insights::config::AppConfig;
use attendance_insights::error::AppError;
use attendance_insights::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryAttendanceStore::default());
    if args.seed_demo {
        let today = Local::now().date_naive();
        seed_demo_term(&store, today).map_err(InsightsError::from)?;
        info!(%today, "demo term loaded");
    }

    let service = Arc::new(AttendanceInsightsService::new(
        store.clone(),
        store.clone(),
        config.insights.clone(),
    ));
    let insights_state = InsightsState { service, store };

    let app = with_insights_routes(insights_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "attendance insights service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
