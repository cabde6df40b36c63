use chrono::NaiveDateTime;

use super::domain::{AttendanceRecord, Session, SessionCounts};

/// A session has been conducted once its end time has passed on the local wall clock.
///
/// Cancelled sessions follow the same time rule; they only drop out of presence counts.
pub fn is_conducted(session: &Session, now: NaiveDateTime) -> bool {
    session.ends_at() <= now
}

/// Counts conducted sessions and the subset the student was marked present for.
pub fn tally_sessions<'a, I>(
    sessions: I,
    records: &[AttendanceRecord],
    now: NaiveDateTime,
) -> SessionCounts
where
    I: IntoIterator<Item = &'a Session>,
{
    let mut counts = SessionCounts::default();
    for session in sessions {
        if !is_conducted(session, now) {
            continue;
        }
        counts.conducted += 1;
        if presence_for(session, records) == Some(true) {
            counts.attended += 1;
        }
    }
    counts
}

/// Presence mark for an attendable session, `None` when unmarked or cancelled.
pub fn presence_for(session: &Session, records: &[AttendanceRecord]) -> Option<bool> {
    if !session.is_attendable() {
        return None;
    }
    records
        .iter()
        .find(|record| record.session_id == session.id)
        .map(|record| record.present)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::domain::{SessionId, SessionStatus, StudentId, SubjectId};
    use chrono::{NaiveDate, NaiveTime};

    fn session(id: &str, day: u32, end_hour: u32, status: SessionStatus) -> Session {
        Session {
            id: SessionId(id.to_string()),
            subject_id: SubjectId("math".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 5, day).expect("valid date"),
            start_time: NaiveTime::from_hms_opt(end_hour - 1, 0, 0).expect("valid time"),
            end_time: NaiveTime::from_hms_opt(end_hour, 0, 0).expect("valid time"),
            status,
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time")
    }

    fn mark(id: &str, present: bool) -> AttendanceRecord {
        AttendanceRecord {
            session_id: SessionId(id.to_string()),
            student_id: StudentId("s-1".to_string()),
            present,
        }
    }

    #[test]
    fn session_counts_once_end_time_is_reached() {
        let lecture = session("a", 10, 11, SessionStatus::Scheduled);
        assert!(!is_conducted(&lecture, at(10, 10, 59)));
        assert!(is_conducted(&lecture, at(10, 11, 0)));
        assert!(is_conducted(&lecture, at(11, 8, 0)));
    }

    #[test]
    fn cancelled_sessions_are_conducted_but_never_attended() {
        let sessions = vec![
            session("a", 9, 10, SessionStatus::Conducted),
            session("b", 10, 10, SessionStatus::Cancelled),
            session("c", 12, 10, SessionStatus::Scheduled),
        ];
        let records = vec![mark("a", true), mark("b", true), mark("c", true)];

        let counts = tally_sessions(&sessions, &records, at(11, 9, 0));
        assert_eq!(counts.conducted, 2);
        assert_eq!(counts.attended, 1);
    }
}
