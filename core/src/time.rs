//! Time related utils.
//!
//! The signing timestamp is rendered as ISO-8601 with an explicit offset,
//! e.g. `2024-01-01T00:00:00+00:00`.

use chrono::FixedOffset;
use chrono::Local;
use chrono::SecondsFormat;
use chrono::Utc;
use log::debug;

use crate::{Error, Result};

/// DateTime with a fixed offset, as it appears on the wire.
pub type DateTime = chrono::DateTime<FixedOffset>;

/// Current time in UTC.
pub fn now() -> DateTime {
    Utc::now().fixed_offset()
}

/// Current time rendered in the given timezone.
///
/// See [`resolve_offset`] for the accepted values.
pub fn now_in(tz: Option<&str>) -> DateTime {
    match resolve_offset(tz) {
        Some(offset) => Utc::now().with_timezone(&offset),
        None => {
            debug!("timezone {tz:?} is not a fixed offset, using system local time");
            Local::now().fixed_offset()
        }
    }
}

/// Resolve a timezone override into a fixed offset.
///
/// - `None`, empty, `UTC`, `GMT` and `Z` resolve to UTC.
/// - `+02:00`, `-0530`, `+05` and the same prefixed with `UTC`/`GMT` resolve to that offset.
/// - Anything else returns `None`, meaning the system local timezone should be used.
pub fn resolve_offset(tz: Option<&str>) -> Option<FixedOffset> {
    let tz = tz.map(str::trim).unwrap_or_default();
    let utc = FixedOffset::east_opt(0);

    if tz.is_empty() {
        return utc;
    }

    let rest = ["UTC", "GMT"]
        .iter()
        .find_map(|p| tz.strip_prefix(p))
        .unwrap_or(tz);
    if rest.is_empty() || rest == "Z" {
        return utc;
    }

    parse_offset(rest)
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 => digits.split_at(2),
        None => (digits, "0"),
    };
    if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Format time into ISO-8601 with offset: `2022-03-13T07:20:04+00:00`
pub fn format_iso8601(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parse an ISO-8601 time with offset.
pub fn parse_iso8601(s: &str) -> Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| Error::unexpected(format!("parse '{s}' into iso8601 failed")).with_source(e))
}
