use attendance_insights::analytics::{AttendanceInsightsService, InMemoryAttendanceStore};
use chrono::NaiveDateTime;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InsightsService =
    AttendanceInsightsService<InMemoryAttendanceStore, InMemoryAttendanceStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// The analytics service plus the store it reads, for endpoints that also write
/// profile flags owned outside the analytics core.
#[derive(Clone)]
pub(crate) struct InsightsState {
    pub(crate) service: Arc<InsightsService>,
    pub(crate) store: Arc<InMemoryAttendanceStore>,
}

pub(crate) fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DDTHH:MM:SS ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_datetime_accepts_both_layouts() {
        let iso = parse_datetime("2024-05-10T18:00:00").expect("iso parses");
        let spaced = parse_datetime(" 2024-05-10 18:00 ").expect("spaced parses");
        assert_eq!(iso, spaced);
        assert!(parse_datetime("yesterday").is_err());
    }
}
