//! Timestamp utilities
//!
//! Entry timestamps are stored as Unix epoch milliseconds (UTC). Calendar
//! days are always interpreted in the server's local time zone.

use crate::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// UTC timestamp to epoch milliseconds
pub fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Epoch milliseconds to UTC timestamp (out-of-range values clamp to the epoch)
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Parse a `YYYY-MM-DD` date supplied by a client
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))
}

/// Inclusive millisecond bounds of a local calendar day
///
/// Start is local midnight, end is one millisecond before the next local
/// midnight, so 23- and 25-hour DST days are covered exactly.
pub fn local_day_bounds(date: NaiveDate) -> (i64, i64) {
    let start = local_midnight_millis(date);
    let end = date
        .succ_opt()
        .map(|next| local_midnight_millis(next) - 1)
        .unwrap_or(i64::MAX);
    (start, end)
}

/// Local calendar day (`YYYY-MM-DD`) containing the given instant
pub fn local_day_key(millis: i64) -> String {
    from_millis(millis)
        .with_timezone(&Local)
        .format("%Y-%m-%d")
        .to_string()
}

fn local_midnight_millis(date: NaiveDate) -> i64 {
    let naive = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.timestamp_millis(),
        // Midnight skipped by a DST jump; treat the wall time as UTC
        None => naive.and_utc().timestamp_millis(),
    }
}
