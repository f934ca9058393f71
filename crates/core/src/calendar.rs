//! Calendar arithmetic for sprint cadences.
//!
//! Every date here is a whole calendar day. Sprint boundaries are the dates
//! that lie an exact multiple of the sprint length away from any known
//! boundary date.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Date returned when a projection can never complete (zero velocity).
pub fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Number of days between 1970-01-01 and `date`.
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`days_since_epoch`], saturating at the representable range.
pub fn from_days_since_epoch(days: i64) -> NaiveDate {
    let from_ce = days
        .saturating_add(UNIX_EPOCH_DAYS_FROM_CE)
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;

    NaiveDate::from_num_days_from_ce_opt(from_ce).unwrap_or(if days < 0 {
        NaiveDate::MIN
    } else {
        NaiveDate::MAX
    })
}

/// Shift `date` by `days`.
///
/// Fractional values are rounded to the nearest whole day (halves away from
/// zero). Non-finite or huge values saturate at the calendar limits.
pub fn increment_date(date: NaiveDate, days: f64) -> NaiveDate {
    // NaN casts to 0, infinities saturate.
    let whole = days.round() as i64;
    from_days_since_epoch(days_since_epoch(date).saturating_add(whole))
}

/// Smallest date `>= date` that lies on the sprint cadence of `any_sprint_boundary`.
///
/// A zero sprint length is treated as a one-day sprint.
pub fn align_to_sprint_boundary(
    any_sprint_boundary: NaiveDate,
    days_in_sprint: u32,
    date: NaiveDate,
) -> NaiveDate {
    let sprint_length = i64::from(days_in_sprint.max(1));
    let boundary_days = days_since_epoch(any_sprint_boundary);
    let days_diff = days_since_epoch(date) - boundary_days;

    // ceil(days_diff / sprint_length), valid for negative differences too
    let mut sprints_diff = days_diff.div_euclid(sprint_length);
    if days_diff.rem_euclid(sprint_length) != 0 {
        sprints_diff += 1;
    }

    from_days_since_epoch(boundary_days + sprints_diff * sprint_length)
}

/// Smallest sprint boundary strictly after `date`.
pub fn next_sprint_boundary(
    any_sprint_boundary: NaiveDate,
    days_in_sprint: u32,
    date: NaiveDate,
) -> NaiveDate {
    let result = align_to_sprint_boundary(any_sprint_boundary, days_in_sprint, date);

    if compare_dates(result, date) == Ordering::Equal {
        return align_to_sprint_boundary(any_sprint_boundary, days_in_sprint, increment_date(date, 1.0));
    }

    result
}

/// Whether `date` starts a sprint.
pub fn is_sprint_boundary(any_sprint_boundary: NaiveDate, days_in_sprint: u32, date: NaiveDate) -> bool {
    align_to_sprint_boundary(any_sprint_boundary, days_in_sprint, date) == date
}

/// Compare two dates by calendar day.
pub fn compare_dates(a: NaiveDate, b: NaiveDate) -> Ordering {
    a.cmp(&b)
}

/// Parse a calendar date, dropping any time-of-day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (the UTC calendar day is kept)
/// and naive `YYYY-MM-DDTHH:MM:SS` timestamps.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|timestamp| timestamp.date())
}
