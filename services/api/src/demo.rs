use crate::infra::{parse_datetime, InsightsService};
use attendance_insights::analytics::{
    AttendanceRecord, BadgeStatus, Dashboard, InMemoryAttendanceStore, InsightsError, Session,
    SessionId, SessionStatus, StoreError, StudentId, SubjectId, SubjectPolicy, SubjectStats,
};
use attendance_insights::config::AppConfig;
use attendance_insights::error::AppError;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use clap::Args;
use std::sync::Arc;

pub(crate) const DEMO_STUDENT: &str = "stu-001";

#[derive(Args, Debug)]
pub(crate) struct DashboardArgs {
    /// Student identifier within the demo term
    #[arg(long, default_value = DEMO_STUDENT)]
    pub(crate) student: String,
    /// Evaluation instant (YYYY-MM-DDTHH:MM:SS). Defaults to now.
    #[arg(long, value_parser = parse_datetime)]
    pub(crate) now: Option<NaiveDateTime>,
    /// Emit the dashboard as JSON instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

struct DemoSubject {
    code: &'static str,
    name: &'static str,
    planned: i64,
    minimum: Option<f64>,
    days: &'static [Weekday],
    start_hour: u32,
    /// Every n-th class is missed; zero means never.
    miss_every: usize,
}

const DEMO_SUBJECTS: [DemoSubject; 4] = [
    DemoSubject {
        code: "MTH101",
        name: "Calculus I",
        planned: 40,
        minimum: None,
        days: &[Weekday::Mon, Weekday::Wed, Weekday::Fri],
        start_hour: 9,
        miss_every: 8,
    },
    DemoSubject {
        code: "PHY110",
        name: "Mechanics",
        planned: 36,
        minimum: Some(80.0),
        days: &[Weekday::Tue, Weekday::Thu],
        start_hour: 11,
        miss_every: 3,
    },
    DemoSubject {
        code: "CHE120",
        name: "General Chemistry",
        planned: 30,
        minimum: None,
        days: &[Weekday::Mon, Weekday::Thu],
        start_hour: 14,
        miss_every: 0,
    },
    DemoSubject {
        code: "CSE100",
        name: "Programming Fundamentals",
        planned: 42,
        minimum: Some(70.0),
        days: &[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ],
        start_hour: 16,
        miss_every: 0,
    },
];

const DEMO_TERM_DAYS: i64 = 21;

/// Three weeks of weekday classes ending on `today`, with a few absences and one
/// cancelled lecture.
pub(crate) fn seed_demo_term(
    store: &InMemoryAttendanceStore,
    today: NaiveDate,
) -> Result<(), StoreError> {
    let student = StudentId(DEMO_STUDENT.to_string());

    for subject in &DEMO_SUBJECTS {
        let subject_id = SubjectId(subject.code.to_lowercase());
        store.upsert_subject(SubjectPolicy {
            subject_id: subject_id.clone(),
            name: subject.name.to_string(),
            code: subject.code.to_string(),
            total_planned_classes: subject.planned,
            minimum_attendance_percent: subject.minimum,
        })?;
        store.enroll(&student, &subject_id)?;

        let mut held = 0usize;
        for offset in (0..DEMO_TERM_DAYS).rev() {
            let date = today - Duration::days(offset);
            if !subject.days.contains(&date.weekday()) {
                continue;
            }
            held += 1;

            let session_id = SessionId(format!("{}-{date}", subject.code.to_lowercase()));
            let cancelled = subject.code == "CHE120" && held == 2;
            store.add_session(Session {
                id: session_id.clone(),
                subject_id: subject_id.clone(),
                date,
                start_time: NaiveTime::from_hms_opt(subject.start_hour, 0, 0)
                    .unwrap_or(NaiveTime::MIN),
                end_time: NaiveTime::from_hms_opt(subject.start_hour + 1, 0, 0)
                    .unwrap_or(NaiveTime::MIN),
                status: if cancelled {
                    SessionStatus::Cancelled
                } else {
                    SessionStatus::Scheduled
                },
            })?;

            if cancelled {
                continue;
            }
            let missed = subject.miss_every > 0 && held % subject.miss_every == 0;
            store.mark_attendance(AttendanceRecord {
                session_id,
                student_id: student.clone(),
                present: !missed,
            })?;
        }
    }

    Ok(())
}

pub(crate) fn run_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let DashboardArgs { student, now, json } = args;

    let config = AppConfig::load()?;
    let now = now.unwrap_or_else(|| Local::now().naive_local());
    let store = Arc::new(InMemoryAttendanceStore::default());
    seed_demo_term(&store, now.date()).map_err(InsightsError::from)?;

    let service = InsightsService::new(store.clone(), store, config.insights);
    let dashboard = service.dashboard(&StudentId(student), now)?;

    if json {
        let rendered = serde_json::to_string_pretty(&dashboard)
            .map_err(std::io::Error::other)?;
        println!("{rendered}");
    } else {
        render_dashboard(&dashboard);
    }
    Ok(())
}

fn render_dashboard(dashboard: &Dashboard) {
    println!("Attendance dashboard for {}", dashboard.student_id);
    println!("Evaluated at {}", dashboard.generated_at);

    println!("\nSubjects");
    for stats in &dashboard.overview.subjects {
        render_subject(stats);
    }

    let status = &dashboard.overview.overall_status;
    if status.is_all_safe {
        println!("\nOverall: every subject is above its minimum");
    } else {
        println!(
            "\nOverall: danger zone in {}",
            status.danger_subjects.join(", ")
        );
    }

    println!("Momentum: {} day(s)", dashboard.momentum);

    if dashboard.badges.is_empty() {
        println!("\nBadges: unavailable");
    } else {
        println!("\nBadges");
        for badge in &dashboard.badges {
            render_badge(badge);
        }
    }
}

fn render_subject(stats: &SubjectStats) {
    println!(
        "- {} ({}): {:.2}% of {} conducted, risk {}, confidence {}",
        stats.subject_name,
        stats.subject_code,
        stats.percentage,
        stats.conducted,
        stats.risk_level.label(),
        stats.confidence.label()
    );
    println!(
        "    next class: attend -> {:.2}%, miss -> {:.2}%. {}",
        stats.percent_if_attend, stats.percent_if_miss, stats.safe_miss_message
    );
}

fn render_badge(badge: &BadgeStatus) {
    let marker = if badge.is_unlocked { "x" } else { " " };
    let awarded = match badge.awarded_at {
        Some(at) => format!(" (awarded {at})"),
        None => String::new(),
    };
    println!("- [{marker}] {}: {}{}", badge.name, badge.progress, awarded);
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_insights::analytics::InsightsConfig;

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).expect("valid date")
    }

    #[test]
    fn demo_term_puts_mechanics_in_the_danger_zone() {
        let store = Arc::new(InMemoryAttendanceStore::default());
        seed_demo_term(&store, friday()).expect("demo term seeds");
        let service = InsightsService::new(store.clone(), store, InsightsConfig::default());

        let now = friday().and_hms_opt(20, 0, 0).expect("valid time");
        let dashboard = service
            .dashboard(&StudentId(DEMO_STUDENT.to_string()), now)
            .expect("dashboard builds");

        assert_eq!(dashboard.overview.subjects.len(), 4);
        assert_eq!(
            dashboard.overview.overall_status.danger_subjects,
            vec!["Mechanics".to_string()]
        );
        assert_eq!(dashboard.momentum, 5);
        assert_eq!(dashboard.badges.len(), 8);
    }
}
