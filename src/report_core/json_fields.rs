//! Tolerant parsing of the JSON-bearing TEXT columns
//!
//! Every helper degrades to an empty container (or `None`) on absent,
//! malformed or wrongly-shaped input. Nothing here returns an error.

use serde_json::{Map, Number, Value};

/// Parse a column as JSON; empty or invalid text yields `None`
pub fn parse_json(text: Option<&str>) -> Option<Value> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Ignoring malformed JSON column ({})", e);
            None
        }
    }
}

/// Parse a column that should hold a JSON object; anything else → empty map
pub fn parse_json_object(text: Option<&str>) -> Map<String, Value> {
    match parse_json(text) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Parse a column that should hold a JSON array; anything else → empty list
pub fn parse_json_list(text: Option<&str>) -> Vec<Value> {
    match parse_json(text) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Coerce a JSON value to an integer count.
///
/// Integers pass through, finite floats truncate, booleans become 0/1 and
/// strings holding a decimal integer are parsed. Everything else is `None`.
pub fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String identifier for a JSON scalar used as a key (hero ids in lists)
pub fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn field<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

pub fn field_object<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    field(object, key).and_then(Value::as_object)
}

pub fn field_number(object: &Map<String, Value>, key: &str) -> Option<Number> {
    match field(object, key)? {
        Value::Number(n) => Some(n.clone()),
        _ => None,
    }
}

pub fn field_string(object: &Map<String, Value>, key: &str) -> Option<String> {
    match field(object, key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn field_bool(object: &Map<String, Value>, key: &str) -> Option<bool> {
    match field(object, key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

/// Any non-container value, kept as-is (e.g. a danger rating that may be a label or a number)
pub fn field_scalar(object: &Map<String, Value>, key: &str) -> Option<Value> {
    match field(object, key)? {
        Value::Array(_) | Value::Object(_) => None,
        scalar => Some(scalar.clone()),
    }
}

/// Number of items in a list field; 0 when missing or not a list
pub fn field_len(object: &Map<String, Value>, key: &str) -> usize {
    field(object, key)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}
