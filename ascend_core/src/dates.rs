//! Calendar day arithmetic shared by the engine modules.

use crate::{Error, Result};
use chrono::{Datelike, Days, Duration, NaiveDate};

/// Parse a `YYYY-MM-DD` day key
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidDate(s.to_string()))
}

/// Format a day as its `YYYY-MM-DD` key
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Whole days from `prev` to `next` (negative if `next` is earlier)
pub fn gap_days(prev: NaiveDate, next: NaiveDate) -> i64 {
    (next - prev).num_days()
}

/// Implicitly skipped days between two logs: `max(0, gap - 1)`
pub fn skipped_between(prev: NaiveDate, next: NaiveDate) -> u32 {
    (gap_days(prev, next) - 1).max(0) as u32
}

/// The `days` consecutive calendar days ending at `end`, oldest first
///
/// Days that would fall before the earliest representable date are left out.
pub fn window_ending(end: NaiveDate, days: usize) -> Vec<NaiveDate> {
    (0..days as u64)
        .rev()
        .filter_map(|offset| end.checked_sub_days(Days::new(offset)))
        .collect()
}

/// Monday of the ISO week containing `date`
pub fn iso_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// True when `date` falls in the same Monday-start week as `today`
pub fn in_same_iso_week(date: NaiveDate, today: NaiveDate) -> bool {
    iso_week_start(date) == iso_week_start(today)
}

/// Monday-first weekday index, 0..=6
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}
