use chrono::NaiveDate;

/// Consecutive calendar days ending today with at least one conducted session.
///
/// The streak is zero until a class has concluded today, even if yesterday's
/// run was unbroken. Input order and duplicate dates do not matter.
pub fn momentum_streak(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut days = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(&latest) = days.first() else {
        return 0;
    };
    if latest != today {
        return 0;
    }

    let mut streak = 1;
    let mut previous = latest;
    for &day in &days[1..] {
        if previous.pred_opt() != Some(day) {
            break;
        }
        streak += 1;
        previous = day;
    }
    streak
}
