//! Value types for PQL query results.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;

/// A temporal value produced by date coercion.
///
/// The variant records how much the source string said: a bare calendar date,
/// a wall-clock time without offset, or a fully zoned instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timestamp {
    /// `YYYY-MM-DD`
    Date(NaiveDate),
    /// Date and time with no UTC offset.
    Local(NaiveDateTime),
    /// Date and time with an explicit UTC offset (or `Z`).
    Zoned(DateTime<FixedOffset>),
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Timestamp::Local(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Timestamp::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// Represents one JSON value in a PQL query result.
///
/// Every element of the server's top-level result array becomes one `Value`
/// (usually an [`Value::Object`]).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// JSON `null`.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer that fits in an i64.
    Long(i64),

    /// Non-negative integer too large for an i64.
    UnsignedLong(u64),

    /// Any other JSON number.
    Double(OrderedFloat<f64>),

    /// String value.
    String(String),

    /// JSON array.
    Array(Vec<Value>),

    /// JSON object. Key order is not preserved.
    Object(BTreeMap<String, Value>),

    /// Date or timestamp recognised by date coercion.
    Time(Timestamp),
}

impl Value {
    /// Returns the value as a string reference if it is a `String` variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a bool if it is a `Bool` variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an i64 if it is a `Long` variant.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a u64 if it is an `UnsignedLong` variant.
    pub fn as_unsigned_long(&self) -> Option<u64> {
        match self {
            Value::UnsignedLong(u) => Some(*u),
            _ => None,
        }
    }

    /// Returns the value as a f64 if it is a `Double` variant.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(f.into_inner()),
            _ => None,
        }
    }

    /// Returns the elements if this is an `Array`.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map if this is an `Object`.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a `Time` variant.
    pub fn as_time(&self) -> Option<&Timestamp> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }

    /// Looks up a field of an `Object`. Returns `None` for any other variant.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Long(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UnsignedLong(u)
                } else {
                    Value::Double(OrderedFloat::from(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Long(i) => serde_json::Value::from(*i),
            Value::UnsignedLong(u) => serde_json::Value::from(*u),
            Value::Double(d) => serde_json::Number::from_f64(d.into_inner())
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
            Value::Time(t) => serde_json::Value::String(t.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Long(i) => write!(f, "{}", i),
            Value::UnsignedLong(u) => write!(f, "{}", u),
            Value::Double(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Time(t) => write!(f, "{}", t),
            Value::Array(_) | Value::Object(_) => {
                write!(f, "{}", serde_json::Value::from(self))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =========================================================================
    // Conversion from serde_json
    // =========================================================================

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(Value::from(json!(42)), Value::Long(42));
        assert_eq!(Value::from(json!(-7)), Value::Long(-7));
        assert_eq!(Value::from(json!(u64::MAX)), Value::UnsignedLong(u64::MAX));
        assert_eq!(Value::from(json!(2.5)), Value::Double(OrderedFloat::from(2.5)));
    }

    #[test]
    fn test_from_json_nested() {
        let v = Value::from(json!({
            "name": "alice",
            "siblings": ["bob", null],
            "address": {"zip": 97201}
        }));

        assert_eq!(v.get("name").and_then(Value::as_str), Some("alice"));
        let siblings = v.get("siblings").and_then(Value::as_array).unwrap();
        assert_eq!(siblings.len(), 2);
        assert!(siblings[1].is_null());
        assert_eq!(
            v.get("address").and_then(|a| a.get("zip")).and_then(Value::as_long),
            Some(97201)
        );
    }

    // =========================================================================
    // Value accessor tests
    // =========================================================================

    #[test]
    fn test_as_str() {
        assert_eq!(Value::String("hello".to_string()).as_str(), Some("hello"));
        assert_eq!(Value::Long(42).as_str(), None);
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Long(1).as_bool(), None);
        assert_eq!(Value::String("true".to_string()).as_bool(), None);
    }

    #[test]
    fn test_as_long_and_unsigned() {
        assert_eq!(Value::Long(i64::MIN).as_long(), Some(i64::MIN));
        assert_eq!(Value::UnsignedLong(42).as_long(), None);
        assert_eq!(Value::UnsignedLong(42).as_unsigned_long(), Some(42));
        assert_eq!(Value::Long(42).as_unsigned_long(), None);
    }

    #[test]
    fn test_as_double() {
        assert_eq!(Value::Double(OrderedFloat::from(2.72)).as_double(), Some(2.72));
        assert_eq!(Value::Long(42).as_double(), None);
    }

    #[test]
    fn test_as_time() {
        let d = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        let v = Value::Time(Timestamp::Date(d));
        assert_eq!(v.as_time(), Some(&Timestamp::Date(d)));
        assert!(Value::String("1990-01-01".to_string()).as_time().is_none());
    }

    #[test]
    fn test_get_on_non_object() {
        assert!(Value::Array(vec![]).get("a").is_none());
        assert!(Value::Null.get("a").is_none());
    }

    // =========================================================================
    // Display tests
    // =========================================================================

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Long(-100).to_string(), "-100");
        assert_eq!(Value::String("hello world".to_string()).to_string(), "hello world");
    }

    #[test]
    fn test_display_containers_as_json() {
        let v = Value::from(json!({"a": [1, true]}));
        assert_eq!(v.to_string(), r#"{"a":[1,true]}"#);
    }

    #[test]
    fn test_display_timestamps() {
        let d = NaiveDate::from_ymd_opt(2023, 11, 14).unwrap();
        assert_eq!(Value::Time(Timestamp::Date(d)).to_string(), "2023-11-14");

        let dt = DateTime::parse_from_rfc3339("2023-11-14T12:30:45+02:00").unwrap();
        assert_eq!(
            Value::Time(Timestamp::Zoned(dt)).to_string(),
            "2023-11-14T12:30:45+02:00"
        );
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Long(42), Value::UnsignedLong(42));
        assert_ne!(Value::String("42".to_string()), Value::Long(42));
    }
}
