//! Timestamp parsing for the `created_readable_utc` field.
//!
//! Post dates arrive as loosely formatted strings.  [`parse_timestamp`]
//! turns them into a numeric sort key and never fails: anything it cannot
//! read becomes `0`, so unparseable dates sort as the oldest.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::warn;

/// Naive formats tried after RFC 3339 and RFC 2822.  Values without an
/// offset are read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Convert a timestamp string to milliseconds since the Unix epoch.
///
/// Returns `0` for `None`, blank input, or any input no supported format
/// accepts.
pub fn parse_timestamp(text: Option<&str>) -> i64 {
    let Some(raw) = text.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0;
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_millis();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.timestamp_millis();
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.and_utc().timestamp_millis();
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return dt.and_utc().timestamp_millis();
    }

    warn!(value = raw, "could not parse post date");
    0
}
