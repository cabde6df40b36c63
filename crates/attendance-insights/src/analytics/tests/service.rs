use super::common::*;
use crate::analytics::achievements::{standard_catalog, MOMENTUM_BUILDER, PERFECT_START};
use crate::analytics::memory::InMemoryAttendanceStore;
use crate::analytics::repository::{AttendanceStore, BadgeStore};
use crate::analytics::service::InsightsError;
use crate::analytics::{AttendanceInsightsService, InsightsConfig};
use chrono::NaiveTime;
use std::sync::Arc;

fn present_streak(store: &InMemoryAttendanceStore, code: &str, days: i64) {
    for offset in (0..days).rev() {
        seed_session(store, code, days_ago(offset), Some(true));
    }
}

#[test]
fn subject_stats_reads_counts_from_raw_rows() {
    let (service, store, _) = build_service();
    enroll(&store, "MTH101", 40);
    for offset in 0..4 {
        seed_session(&store, "MTH101", days_ago(offset + 1), Some(offset != 0));
    }
    seed_session(&store, "MTH101", days_ago(10), None);

    let stats = service
        .subject_stats(&student(), &subject_id("MTH101"), evening())
        .expect("stats compute");
    assert_eq!(stats.conducted, 5);
    assert_eq!(stats.attended, 3);
    assert_eq!(stats.percentage, 60.0);
    assert_eq!(stats.subject_name, "MTH101 Lecture");
}

#[test]
fn subject_stats_reports_unknown_subjects() {
    let (service, _, _) = build_service();
    match service.subject_stats(&student(), &subject_id("GHOST"), evening()) {
        Err(InsightsError::NotFound(_)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn sessions_still_in_progress_are_not_counted() {
    let (service, store, _) = build_service();
    enroll(&store, "MTH101", 40);
    seed_session(&store, "MTH101", today(), Some(true));

    let mid_lecture = today().and_time(NaiveTime::from_hms_opt(9, 30, 0).expect("valid"));
    let stats = service
        .subject_stats(&student(), &subject_id("MTH101"), mid_lecture)
        .expect("stats compute");
    assert_eq!(stats.conducted, 0);
    assert_eq!(service.momentum(&student(), mid_lecture).expect("momentum"), 0);

    assert_eq!(service.momentum(&student(), evening()).expect("momentum"), 1);
}

#[test]
fn overview_skips_missing_subjects_and_keeps_the_rest() {
    let (service, store, events) = build_service();
    enroll(&store, "MTH101", 40);
    enroll(&store, "PHY110", 40);
    seed_session(&store, "MTH101", days_ago(1), Some(true));
    store
        .remove_subject(&subject_id("PHY110"))
        .expect("subject removed");

    let overview = service.overview(&student(), evening()).expect("overview");
    assert_eq!(overview.subjects.len(), 1);
    assert_eq!(overview.subjects[0].subject_id, subject_id("MTH101"));
    assert!(overview.overall_status.is_all_safe);
    assert!(events
        .events()
        .contains(&RecordedEvent::SubjectSkipped(subject_id("PHY110"))));
}

#[test]
fn overview_skips_subjects_with_inconsistent_counts() {
    let store = InMemoryAttendanceStore::default();
    enroll(&store, "MTH101", 40);
    enroll(&store, "PHY110", 40);
    seed_session(&store, "MTH101", days_ago(1), Some(true));
    let corrupt = Arc::new(CorruptCountsStore {
        inner: store.clone(),
        corrupt: subject_id("PHY110"),
    });
    let events = Arc::new(RecordingEvents::default());
    let service = AttendanceInsightsService::with_events(
        corrupt,
        Arc::new(store),
        events.clone(),
        InsightsConfig::default(),
    );

    let overview = service.overview(&student(), evening()).expect("overview");
    assert_eq!(overview.subjects.len(), 1);
    assert_eq!(
        events.events(),
        vec![RecordedEvent::SubjectSkipped(subject_id("PHY110"))]
    );
}

#[test]
fn overview_fails_when_store_is_unreachable() {
    let store = Arc::new(UnavailableStore);
    let service = AttendanceInsightsService::new(store.clone(), store, InsightsConfig::default());

    match service.overview(&student(), evening()) {
        Err(InsightsError::StoreUnavailable(_)) => {}
        other => panic!("expected store unavailable, got {other:?}"),
    }
}

#[test]
fn empty_enrollment_is_vacuously_safe() {
    let (service, _, events) = build_service();
    let overview = service.overview(&student(), evening()).expect("overview");
    assert!(overview.subjects.is_empty());
    assert!(overview.overall_status.is_all_safe);
    assert!(overview.overall_status.danger_subjects.is_empty());
    assert!(events.events().is_empty());
}

#[test]
fn danger_flag_is_a_one_way_ratchet() {
    let (service, store, events) = build_service();
    enroll(&store, "MTH101", 40);
    seed_session(&store, "MTH101", days_ago(3), Some(false));

    let overview = service.overview(&student(), evening()).expect("overview");
    assert_eq!(
        overview.overall_status.danger_subjects,
        vec!["MTH101 Lecture".to_string()]
    );
    assert!(events
        .events()
        .contains(&RecordedEvent::DangerFlagged(vec!["MTH101 Lecture".to_string()])));
    assert!(store.student_profile(&student()).expect("profile").has_been_in_danger);

    for offset in 0..3 {
        seed_session(&store, "MTH101", days_ago(offset), Some(true));
    }
    let recovered = service.overview(&student(), evening()).expect("overview");
    assert!(recovered.overall_status.is_all_safe);
    assert!(store.student_profile(&student()).expect("profile").has_been_in_danger);
}

#[test]
fn badges_unlock_once_and_stay_unlocked() {
    let (service, store, events) = build_service();
    enroll(&store, "MTH101", 40);
    present_streak(&store, "MTH101", 5);

    let first = service.badges(&student(), evening());
    let builder = first
        .iter()
        .find(|badge| badge.code == MOMENTUM_BUILDER)
        .expect("badge listed");
    assert!(builder.is_unlocked);
    assert_eq!(builder.awarded_at, Some(evening()));
    assert!(first
        .iter()
        .find(|badge| badge.code == PERFECT_START)
        .expect("badge listed")
        .is_unlocked);

    let awarded_events = events
        .events()
        .into_iter()
        .filter(|event| matches!(event, RecordedEvent::BadgeAwarded(_)))
        .count();

    // Two days later with no classes since, momentum is zero.
    let later = evening() + chrono::Duration::days(2);
    assert_eq!(service.momentum(&student(), later).expect("momentum"), 0);
    let second = service.badges(&student(), later);
    let builder = second
        .iter()
        .find(|badge| badge.code == MOMENTUM_BUILDER)
        .expect("badge listed");
    assert!(builder.is_unlocked);
    assert_eq!(builder.awarded_at, Some(evening()));
    assert_eq!(builder.progress, "0/5 Days Streak");

    let awarded_again = events
        .events()
        .into_iter()
        .filter(|event| matches!(event, RecordedEvent::BadgeAwarded(_)))
        .count();
    assert_eq!(awarded_events, awarded_again);
    assert_eq!(
        store.awarded_badges(&student()).expect("awards").len(),
        awarded_events
    );
}

#[test]
fn unlocked_badges_are_listed_first() {
    let (service, store, _) = build_service();
    enroll(&store, "MTH101", 40);
    present_streak(&store, "MTH101", 5);

    let badges = service.badges(&student(), evening());
    assert_eq!(badges.len(), 8);
    let first_locked = badges
        .iter()
        .position(|badge| !badge.is_unlocked)
        .unwrap_or(badges.len());
    assert!(badges[first_locked..].iter().all(|badge| !badge.is_unlocked));
    assert!(first_locked >= 2);
}

#[test]
fn award_writes_are_idempotent_at_the_store() {
    let store = InMemoryAttendanceStore::default();
    let first = store
        .award_badge(&student(), PERFECT_START, evening())
        .expect("award stored");
    let second = store
        .award_badge(
            &student(),
            PERFECT_START,
            evening() + chrono::Duration::hours(1),
        )
        .expect("award stored");

    assert_eq!(first, second);
    assert_eq!(store.awarded_badges(&student()).expect("awards").len(), 1);
}

#[test]
fn badges_fail_open_when_store_is_unreachable() {
    let store = Arc::new(UnavailableStore);
    let events = Arc::new(RecordingEvents::default());
    let service = AttendanceInsightsService::with_events(
        store.clone(),
        store,
        events.clone(),
        InsightsConfig::default(),
    );

    assert!(service.badges(&student(), evening()).is_empty());
    assert!(matches!(
        events.events().as_slice(),
        [RecordedEvent::BadgesUnavailable(_)]
    ));
}

#[test]
fn dashboard_survives_badge_store_outage() {
    let attendance = InMemoryAttendanceStore::default();
    enroll(&attendance, "MTH101", 40);
    present_streak(&attendance, "MTH101", 2);
    let events = Arc::new(RecordingEvents::default());
    let service = AttendanceInsightsService::with_events(
        Arc::new(attendance),
        Arc::new(UnavailableStore),
        events.clone(),
        InsightsConfig::default(),
    );

    let dashboard = service.dashboard(&student(), evening()).expect("dashboard");
    assert_eq!(dashboard.overview.subjects.len(), 1);
    assert_eq!(dashboard.momentum, 2);
    assert!(dashboard.badges.is_empty());
    assert!(events
        .events()
        .iter()
        .any(|event| matches!(event, RecordedEvent::BadgesUnavailable(_))));
}

#[test]
fn simulator_usage_unlocks_strategist_once_safe() {
    let (service, store, _) = build_service();
    enroll(&store, "MTH101", 40);
    seed_session(&store, "MTH101", days_ago(3), Some(true));

    let outcome = service
        .simulate(
            &student(),
            &subject_id("MTH101"),
            crate::analytics::SimulationPlan { attend: 0, miss: 1 },
            evening(),
        )
        .expect("simulation");
    assert_eq!(outcome.projected.percentage, 50.0);

    store
        .mark_used_simulator(&student())
        .expect("flag stored");
    let badges = service.badges(&student(), evening());
    assert!(badges
        .iter()
        .any(|badge| badge.code == "ATTENDANCE_STRATEGIST" && badge.is_unlocked));
}

#[test]
fn custom_engine_rules_drive_unlocks() {
    let (service, store, _) = build_service();
    enroll(&store, "MTH101", 40);
    seed_session(&store, "MTH101", days_ago(0), Some(true));
    let service = service.with_engine(crate::analytics::AchievementEngine::new(vec![(
        MOMENTUM_BUILDER.to_string(),
        crate::analytics::BadgeRule::MomentumAtLeast { days: 1 },
    )]));

    let badges = service.badges(&student(), evening());
    assert_eq!(badges.len(), 8);
    assert_eq!(badges[0].code, MOMENTUM_BUILDER);
    assert!(badges[0].is_unlocked);
    assert!(badges[1..].iter().all(|badge| !badge.is_unlocked));
    assert_eq!(badges[1].progress, "");
}

#[test]
fn satisfied_rules_outside_the_catalog_are_never_awarded() {
    let (service, store, _) = build_service();
    enroll(&store, "MTH101", 40);
    seed_session(&store, "MTH101", days_ago(0), Some(true));
    store
        .set_catalog(
            standard_catalog()
                .into_iter()
                .map(|entry| entry.definition)
                .filter(|definition| definition.code != MOMENTUM_BUILDER)
                .collect(),
        )
        .expect("catalog stored");
    let service = service.with_engine(crate::analytics::AchievementEngine::new(vec![(
        MOMENTUM_BUILDER.to_string(),
        crate::analytics::BadgeRule::MomentumAtLeast { days: 1 },
    )]));

    let badges = service.badges(&student(), evening());
    assert_eq!(badges.len(), 7);
    assert!(badges.iter().all(|badge| badge.code != MOMENTUM_BUILDER));
    assert!(badges.iter().all(|badge| !badge.is_unlocked));
    assert!(store.awarded_badges(&student()).expect("awards").is_empty());
}
