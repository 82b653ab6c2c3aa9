use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::models::CheckInHistory;

/// Storage format for a check-in time of day
pub const TIME_FORMAT: &str = "%H:%M";

/// Drop seconds and sub-second precision from a time of day
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

/// Format a time of day as `HH:MM`
pub fn format_time(time: NaiveTime) -> String {
    truncate_to_minute(time).format(TIME_FORMAT).to_string()
}

/// Parse `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff` and truncate to the minute
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();

    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(value, TIME_FORMAT))
        .ok()
        .map(truncate_to_minute)
}

/// Position of `date` inside a week starting on `first_day` (0..=6)
pub fn day_of_week_index(date: NaiveDate, first_day: Weekday) -> usize {
    let day = date.weekday().num_days_from_monday();
    let first = first_day.num_days_from_monday();

    ((day + 7 - first) % 7) as usize
}

/// First date of the week containing `date`
pub fn start_of_week(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    let offset = day_of_week_index(date, first_day) as u64;
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// Which days of the current week, up to and including `today`, have a check-in.
///
/// Index 0 is `first_day`. Days after `today` are always `false`, they cannot
/// have happened yet.
pub fn compute_week_completion(
    history: &CheckInHistory,
    today: NaiveDate,
    first_day: Weekday,
) -> [bool; 7] {
    let week_start = start_of_week(today, first_day);
    let today_index = day_of_week_index(today, first_day);
    let mut completion = [false; 7];

    for (i, done) in completion.iter_mut().enumerate().take(today_index + 1) {
        *done = week_start
            .checked_add_days(Days::new(i as u64))
            .is_some_and(|date| history.contains_date(date));
    }

    completion
}
