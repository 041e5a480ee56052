// chaintrack/src/dates.rs
//
// Calendar helpers shared by both stores. The nested documents key years and
// months as unpadded decimal strings; the completion grid addresses days as
// 1-based positions in a month-length array while comments key days as
// decimal strings.

use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::error::{Result, StoreError};

/// How many days a given month has, leap years included.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| StoreError::Validation(format!("invalid month {year}-{month}")))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("first of month is always valid");
    Ok((next - first).num_days() as u32)
}

/// Validates a (year, month, day) triple against the real calendar.
pub fn valid_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| StoreError::Validation(format!("invalid date {year}-{month}-{day}")))
}

/// Year and month keys for the nested documents ("2023", "6").
pub fn month_keys(date: NaiveDate) -> (String, String) {
    (date.year().to_string(), date.month().to_string())
}

/// Year, month and day keys, all strings (comment tree shape).
pub fn day_keys(date: NaiveDate) -> (String, String, String) {
    (
        date.year().to_string(),
        date.month().to_string(),
        date.day().to_string(),
    )
}

/// 0-based position of `date`'s day in its month array.
pub fn day_index(date: NaiveDate) -> usize {
    (date.day() - 1) as usize
}

/// Lazy, infinite sequence of dates starting at `start` and stepping by a
/// fixed signed day offset. Restart by constructing a new one.
pub fn date_sequence(start: NaiveDate, step_days: i64) -> impl Iterator<Item = NaiveDate> {
    let step = TimeDelta::days(step_days);
    std::iter::successors(Some(start), move |d| Some(*d + step))
}

/// Abbreviated weekday name ("Sun", "Mon", ...).
pub fn weekday_abbrev(date: NaiveDate) -> String {
    date.format("%a").to_string()
}
