//! Wall-clock timestamp parsing.
//!
//! Survey exports carry screen timestamps either as ISO-8601 with a `Z`
//! suffix or as `YYYY-MM-DD HH:MM:SS.ffffff+00:00`. Both are UTC and resolve
//! to integer milliseconds since the Unix epoch.

use crate::error::ParseError;
use chrono::NaiveDateTime;

const ISO_ZULU: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const ISO_OFFSET_UTC: &str = "%Y-%m-%d %H:%M:%S%.f+00:00";

/// Millisecond magnitude threshold: 13-digit epoch values.
const MILLIS_MAGNITUDE: i64 = 1_000_000_000_000;

/// Parse a survey timestamp into epoch milliseconds.
///
/// Bare integers are accepted as already being epoch milliseconds.
pub fn parse_epoch_millis(raw: &str) -> Result<i64, ParseError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ParseError::Timestamp(raw.to_string()));
    }

    if let Ok(ms) = s.parse::<i64>() {
        return Ok(ms);
    }

    let format = if s.ends_with('Z') {
        ISO_ZULU
    } else {
        ISO_OFFSET_UTC
    };

    NaiveDateTime::parse_from_str(s, format)
        .map(|dt| dt.and_utc().timestamp_millis())
        .map_err(|_| ParseError::Timestamp(raw.to_string()))
}

/// Scale a timestamp recorded with coarser precision (e.g. 10-digit
/// seconds) up to 13-digit milliseconds.
pub fn to_millis_magnitude(mut ts: i64) -> i64 {
    if ts <= 0 {
        return ts;
    }
    while ts < MILLIS_MAGNITUDE {
        ts *= 10;
    }
    ts
}
