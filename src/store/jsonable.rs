//! Best-effort conversion of values into strictly serializable JSON.
//!
//! The audit log must never fail on serialization, whatever the caller put
//! in a payload. Floats without a JSON encoding fall back to their string
//! representation and timestamps are rendered as ISO-8601 strings.

use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};

/// Encode a float as a JSON number, falling back to its string
/// representation when it has no JSON encoding (NaN, infinities).
pub fn json_number(value: f64) -> Value {
    match Number::from_f64(value) {
        Some(n) => Value::Number(n),
        None => Value::String(value.to_string()),
    }
}

/// ISO-8601 rendition of a timestamp for persisted payloads.
pub fn json_timestamp(value: DateTime<Utc>) -> Value {
    Value::String(value.to_rfc3339())
}

/// Recursively sanitize a JSON value so it round-trips through the store:
/// arrays and objects are rebuilt with sanitized children, float numbers are
/// re-encoded through [`json_number`], and everything else passes through.
pub fn to_jsonable(value: &Value) -> Value {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => value.clone(),
        Value::Number(n) => {
            if n.is_f64() {
                match n.as_f64() {
                    Some(f) => json_number(f),
                    None => value.clone(),
                }
            } else {
                value.clone()
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(to_jsonable).collect()),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), to_jsonable(item));
            }
            Value::Object(out)
        }
    }
}
