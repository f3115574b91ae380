//! Identifier extraction from response bodies
//!
//! Walks a JSON document and records every scalar field under its key,
//! first occurrence wins. For a list of homogeneous records this makes the
//! first record's `id` the ambient "the id" for the rest of the batch.

use serde_json::Value;

use crate::context::Identifiers;

/// Flatten scalar fields of `value` into a `key -> string` mapping.
///
/// - arrays are walked element-wise, introducing no keys
/// - a key already recorded with a non-empty value is skipped entirely,
///   nested objects under it included
/// - objects and arrays are recursed into, never recorded
/// - `null` is ignored
///
/// Non-object input (including a bare scalar) yields an empty mapping.
#[must_use]
pub fn extract(value: &Value) -> Identifiers {
    let mut found = Identifiers::new();
    scan(value, &mut found);
    found
}

fn scan(value: &Value, found: &mut Identifiers) {
    match value {
        Value::Array(items) => {
            for item in items {
                scan(item, found);
            }
        }
        Value::Object(map) => {
            for (key, val) in map {
                if found.get(key).is_some_and(|v| !v.is_empty()) {
                    continue;
                }
                match scalar_to_string(val) {
                    Some(s) => {
                        found.insert(key.clone(), s);
                    }
                    None => scan(val, found),
                }
            }
        }
        _ => {}
    }
}

/// String form of a JSON scalar; `None` for null, objects and arrays.
///
/// Integral floats print without a fractional part (`3.0` → `"3"`), which is
/// how the value reads when it is spliced into a URL.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_to_string(n)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
