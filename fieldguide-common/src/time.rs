//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a first-sighting timestamp for display, e.g. `Jan 1, 2024`
pub fn format_seen_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Whole hours from `now` until the instant named by a `retry-after` value
///
/// Accepts both forms the header allows: an HTTP-date
/// (`Wed, 21 Oct 2015 07:28:00 GMT`) or a number of seconds. Partial hours
/// round up so a 2h59m window reads as 3 hours; instants in the past yield 0.
/// Returns `None` when the value is neither form.
pub fn hours_until(retry_after: &str, now: DateTime<Utc>) -> Option<i64> {
    let value = retry_after.trim();

    let seconds = if let Ok(delay) = value.parse::<i64>() {
        delay
    } else {
        let instant = DateTime::parse_from_rfc2822(value)
            .or_else(|_| DateTime::parse_from_rfc3339(value))
            .ok()?;
        instant.with_timezone(&Utc).signed_duration_since(now).num_seconds()
    };

    if seconds <= 0 {
        return Some(0);
    }

    Some(seconds / 3600 + i64::from(seconds % 3600 != 0))
}
