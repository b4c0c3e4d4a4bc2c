//! Human-readable rendering of webhook timestamps.
//!
//! GitHub sends ISO-8601 strings (`2021-04-01T21:30:00Z`, or with a numeric offset on
//! commit timestamps). The feed shows them as `1st April 2021 - 09:30 PM UTC`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Formats an ISO-8601 timestamp as `"<day><suffix> <Month> <Year> - <hh>:<mm> <AM|PM> UTC"`.
///
/// Unparseable input is returned unchanged.
pub fn format_timestamp(iso_timestamp: &str) -> String {
    match parse_iso8601(iso_timestamp) {
        Some(instant) => format_utc(&instant),
        None => {
            warn!(
                timestamp = %iso_timestamp,
                "Unparseable timestamp, keeping raw value"
            );
            iso_timestamp.to_string()
        }
    }
}

/// Parses the ISO-8601 shapes GitHub emits into a UTC instant.
///
/// Offsets are honoured and converted; values without one are taken as UTC.
pub fn parse_iso8601(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// English ordinal suffix for a day of the month.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (11..=20).contains(&(day % 100)) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

fn format_utc(instant: &DateTime<Utc>) -> String {
    let day = instant.day();
    format!(
        "{day}{} {}",
        ordinal_suffix(day),
        instant.format("%B %Y - %I:%M %p UTC")
    )
}
