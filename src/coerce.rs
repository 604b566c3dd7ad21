//! Optional coercion of ISO-8601 strings into temporal values.
//!
//! When a client is configured with `coerce_dates`, every record passes
//! through [`coerce`] before it is handed to the caller. Strings that parse
//! as a date or datetime become [`Value::Time`]; everything else is returned
//! as it was.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::value::{Timestamp, Value};

/// Zoned layouts tried after RFC 3339. `%z` accepts `+hh:mm` and `+hhmm`;
/// a trailing `Z` is rewritten to `+00:00` first.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Returns a copy of `value` with every date-like string leaf replaced by a
/// [`Value::Time`].
///
/// Never fails: strings that do not parse are kept verbatim, and object keys
/// are never touched.
pub fn coerce(value: &Value) -> Value {
    match value {
        Value::String(s) => match parse_timestamp(s) {
            Some(ts) => Value::Time(ts),
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(coerce).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), coerce(v)))
                .collect(),
        ),
        Value::Null
        | Value::Bool(_)
        | Value::Long(_)
        | Value::UnsignedLong(_)
        | Value::Double(_)
        | Value::Time(_) => value.clone(),
    }
}

/// Tries to read `s` as an ISO-8601 date or datetime.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    if !looks_like_date(s) {
        return None;
    }

    if s.len() == 10 {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(Timestamp::Date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Timestamp::Zoned(dt));
    }

    let zoned = match s.strip_suffix(|c: char| c == 'Z' || c == 'z') {
        Some(head) => format!("{}+00:00", head),
        None => s.to_string(),
    };

    ZONED_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&zoned, fmt).ok())
        .map(Timestamp::Zoned)
        .or_else(|| {
            LOCAL_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(Timestamp::Local)
        })
}

/// Cheap shape check (`DDDD-DD-DD` prefix) so ordinary strings skip chrono.
fn looks_like_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}
