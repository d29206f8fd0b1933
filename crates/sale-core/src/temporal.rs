//! # Temporal Codec
//!
//! Converts between the wire timestamp (an absolute UTC instant) and the
//! value a `datetime-local` input holds (`YYYY-MM-DDTHH:mm`, local time,
//! minute precision, no zone suffix).
//!
//! ```text
//! wire  2024-01-01T10:00:00Z ── from_wire ──► "2024-01-01T11:00"  form (UTC+1)
//! wire  2024-01-01T10:00:00Z ◄── to_wire ──── "2024-01-01T11:00"  form (UTC+1)
//! ```
//!
//! Every function comes in two flavours: one using the process's local zone
//! and an `_in` variant taking the zone explicitly. Tests use the latter so
//! they do not depend on the machine's `TZ`.
//!
//! Law: `from_wire(to_wire(s)) == s` for every well-formed `s` that names a
//! local time that exists.

use std::fmt::Display;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{CoreError, CoreResult};

/// Shape of a form date-time string.
pub const FORM_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Same shape with seconds, as some browsers submit it.
const FORM_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// Wire instant → local form string, in the process's zone.
///
/// Returns `None` when the instant is absent.
pub fn from_wire(ts: Option<&DateTime<Utc>>) -> Option<String> {
    from_wire_in(ts, &Local)
}

/// Wire instant → form string in `tz`.
pub fn from_wire_in<Tz>(ts: Option<&DateTime<Utc>>, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.map(|t| t.with_timezone(tz).format(FORM_FORMAT).to_string())
}

/// Local form string → wire instant, in the process's zone.
pub fn to_wire(value: &str) -> CoreResult<DateTime<Utc>> {
    to_wire_in(value, &Local)
}

/// Form string in `tz` → wire instant.
///
/// ## Rules
/// - Shape must be `YYYY-MM-DDTHH:mm`, optionally followed by `:ss`
/// - Seconds are dropped (minute precision)
/// - A local time repeated by a daylight-saving fold resolves to the
///   earlier instant
/// - A local time skipped by a daylight-saving gap is an error
pub fn to_wire_in<Tz: TimeZone>(value: &str, tz: &Tz) -> CoreResult<DateTime<Utc>> {
    let trimmed = value.trim();
    let format = match trimmed.len() {
        16 => FORM_FORMAT,
        19 => FORM_FORMAT_SECONDS,
        _ => {
            return Err(CoreError::invalid_timestamp(
                value,
                "expected YYYY-MM-DDTHH:mm",
            ))
        }
    };
    if !has_form_shape(trimmed) {
        return Err(CoreError::invalid_timestamp(value, "expected YYYY-MM-DDTHH:mm"));
    }

    let naive = NaiveDateTime::parse_from_str(trimmed, format)
        .map_err(|e| CoreError::invalid_timestamp(value, e.to_string()))?;
    let naive = naive.with_second(0).unwrap_or(naive);

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(CoreError::invalid_timestamp(
            value,
            "local time does not exist in this time zone",
        )),
    }
}

/// Checks digit and separator positions; `parse_from_str` alone accepts
/// single-digit fields.
fn has_form_shape(s: &str) -> bool {
    s.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        10 => b == b'T',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    })
}

/// The current instant, truncated to the minute, as a form string.
pub fn default_now() -> String {
    default_now_at(&Local::now())
}

/// `now` truncated to the minute, as a form string in `now`'s zone.
pub fn default_now_at<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format(FORM_FORMAT).to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn plus_one() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    #[test]
    fn test_from_wire_formats_in_zone() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(from_wire_in(Some(&ts), &Utc).as_deref(), Some("2024-01-01T10:00"));
        assert_eq!(from_wire_in(Some(&ts), &plus_one()).as_deref(), Some("2024-01-01T11:00"));
        assert_eq!(from_wire_in(None, &Utc), None);
    }

    #[test]
    fn test_from_wire_drops_seconds() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
        assert_eq!(from_wire_in(Some(&ts), &Utc).as_deref(), Some("2024-06-30T23:59"));
    }

    #[test]
    fn test_to_wire_interprets_in_zone() {
        let ts = to_wire_in("2024-01-01T11:00", &plus_one()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_to_wire_accepts_seconds_and_truncates() {
        let ts = to_wire_in("2024-01-01T10:00:42", &Utc).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_to_wire_rejects_malformed() {
        for bad in [
            "",
            "2024-01-01",
            "2024-1-1T10:00",
            "2024-01-01 10:00",
            "2024-01-01T25:00",
            "2024-02-30T10:00",
            "2024-01-01T10:00Z",
            "yesterday",
        ] {
            let err = to_wire_in(bad, &Utc).unwrap_err();
            assert!(matches!(err, CoreError::InvalidTimestamp { .. }), "{bad}");
        }
    }

    #[test]
    fn test_round_trip_law() {
        let zones = [
            FixedOffset::east_opt(0).unwrap(),
            plus_one(),
            FixedOffset::west_opt(5 * 3600 + 1800).unwrap(),
        ];
        let samples = [
            "2024-01-01T00:00",
            "2024-02-29T12:34",
            "1999-12-31T23:59",
            "2030-07-04T08:05",
        ];
        for tz in &zones {
            for s in samples {
                let wire = to_wire_in(s, tz).unwrap();
                assert_eq!(from_wire_in(Some(&wire), tz).as_deref(), Some(s), "{s} in {tz}");
            }
        }
    }

    #[test]
    fn test_default_now_truncates_to_minute() {
        let now = plus_one().with_ymd_and_hms(2024, 3, 5, 9, 7, 59).unwrap();
        assert_eq!(default_now_at(&now), "2024-03-05T09:07");
    }

    #[test]
    fn test_default_now_is_well_formed() {
        let now = default_now();
        assert_eq!(now.len(), 16);
        assert!(to_wire(&now).is_ok());
    }
}
