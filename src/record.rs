use chrono::{DateTime, FixedOffset, Utc};
use serde::ser::{Error as _, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use tracing::Level;

use crate::request::HttpRequest;
use crate::stack::ErrorValue;
use crate::ERROR_KEY;

/// One log event before formatting.
///
/// Formatters only borrow an entry; formatting the same entry twice yields
/// the same bytes.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub time: DateTime<FixedOffset>,
    pub message: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogEntry {
    /// Create an entry stamped with the current UTC time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        LogEntry {
            level,
            time: Utc::now().into(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn at(mut self, time: impl Into<DateTime<FixedOffset>>) -> Self {
        self.time = time.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach an error under the conventional `error` key.
    pub fn with_error(self, err: impl Into<ErrorValue>) -> Self {
        self.with_field(ERROR_KEY, FieldValue::Error(err.into()))
    }
}

/// Lowercase level name as written into the `level` field.
pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        _ => "trace",
    }
}

/// Value of a log entry field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
    Seq(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
    Error(ErrorValue),
    Request(HttpRequest),
}

impl FieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::I64(_) | FieldValue::U64(_) => "integer",
            FieldValue::F64(_) => "float",
            FieldValue::Str(_) => "string",
            FieldValue::Seq(_) => "sequence",
            FieldValue::Map(_) => "map",
            FieldValue::Error(_) => "error",
            FieldValue::Request(_) => "request",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Nested errors render as their message; requests and non-finite floats
/// have no JSON form and fail serialization.
impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::I64(n) => serializer.serialize_i64(*n),
            FieldValue::U64(n) => serializer.serialize_u64(*n),
            FieldValue::F64(n) if !n.is_finite() => {
                Err(S::Error::custom("non-finite float has no JSON representation"))
            }
            FieldValue::F64(n) => serializer.serialize_f64(*n),
            FieldValue::Str(s) => serializer.serialize_str(s),
            FieldValue::Seq(items) => items.serialize(serializer),
            FieldValue::Map(map) => map.serialize(serializer),
            FieldValue::Error(err) => serializer.serialize_str(err.message()),
            FieldValue::Request(_) => Err(S::Error::custom("http request has no JSON representation")),
        }
    }
}

/// String form used for identifiers such as `user`.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::I64(n) => write!(f, "{}", n),
            FieldValue::U64(n) => write!(f, "{}", n),
            FieldValue::F64(n) => write!(f, "{}", n),
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Error(err) => f.write_str(err.message()),
            FieldValue::Request(req) => write!(f, "{} {}", req.method, req.path),
            FieldValue::Seq(_) | FieldValue::Map(_) => match serde_json::to_string(self) {
                Ok(json) => f.write_str(&json),
                Err(_) => write!(f, "{:?}", self),
            },
        }
    }
}

macro_rules! from_int {
    ($variant:ident, $target:ty: $($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::$variant(v as $target)
            }
        })*
    };
}

from_int!(I64, i64: i8, i16, i32, i64, isize);
from_int!(U64, u64: u8, u16, u32, u64, usize);

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::F64(v as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::F64(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(v: Vec<T>) -> Self {
        FieldValue::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(v: BTreeMap<String, FieldValue>) -> Self {
        FieldValue::Map(v)
    }
}

impl From<ErrorValue> for FieldValue {
    fn from(v: ErrorValue) -> Self {
        FieldValue::Error(v)
    }
}

impl From<HttpRequest> for FieldValue {
    fn from(v: HttpRequest) -> Self {
        FieldValue::Request(v)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;

        match v {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::I64(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::U64(u)
                } else {
                    n.as_f64().map_or(FieldValue::Null, FieldValue::F64)
                }
            }
            Value::String(s) => FieldValue::Str(s),
            Value::Array(items) => FieldValue::Seq(items.into_iter().map(FieldValue::from).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, FieldValue::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_matches_plain_value() {
        assert_eq!(FieldValue::from(65535).to_string(), "65535");
        assert_eq!(FieldValue::from("alice").to_string(), "alice");
        assert_eq!(FieldValue::from(true).to_string(), "true");
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::from(vec![1, 2]).to_string(), "[1,2]");
    }

    #[test]
    fn from_json_keeps_structure() {
        let value = FieldValue::from(json!({"a": [1, -2, 1.5, "x", null, true]}));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({"a": [1, -2, 1.5, "x", null, true]}));
    }

    #[test]
    fn nested_error_serializes_as_message() {
        let mut map = BTreeMap::new();
        map.insert("cause".to_string(), FieldValue::Error(ErrorValue::new("timeout")));
        let value = FieldValue::Map(map);
        assert_eq!(serde_json::to_value(&value).unwrap(), json!({"cause": "timeout"}));
    }

    #[test]
    fn request_is_not_serializable() {
        let value = FieldValue::Seq(vec![FieldValue::Request(HttpRequest::new("GET", "/"))]);
        assert!(serde_json::to_vec(&value).is_err());
    }

    #[test]
    fn non_finite_floats_are_not_serializable() {
        assert!(serde_json::to_vec(&FieldValue::from(f64::NAN)).is_err());
        assert!(serde_json::to_vec(&FieldValue::from(f64::NEG_INFINITY)).is_err());
        assert_eq!(serde_json::to_string(&FieldValue::from(0.25)).unwrap(), "0.25");
    }

    #[test]
    fn level_names_are_lowercase() {
        assert_eq!(level_name(&Level::WARN), "warn");
        assert_eq!(level_name(&Level::TRACE), "trace");
        assert_eq!(level_name(&Level::DEBUG), "debug");
    }

    #[test]
    fn with_error_uses_error_key() {
        let entry = LogEntry::new(Level::ERROR, "failed").with_error(ErrorValue::new("e"));
        assert_eq!(entry.fields.get(ERROR_KEY), Some(&FieldValue::Error(ErrorValue::new("e"))));
    }
}
