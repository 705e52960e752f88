// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lenient field extraction from dynamic JSON objects.
//!
//! The server omits fields, sends `null`, and occasionally changes a field's
//! type between releases. Every accessor here maps "missing", "null" and
//! "wrong type" uniformly to `None` so decoding never fails on a type
//! mismatch.

use serde_json::{Map, Value};

/// A JSON object.
pub type Object = Map<String, Value>;

/// Returns the value for `key` unless it is missing or `null`.
pub fn present<'a>(obj: &'a Object, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Returns a string field.
pub fn string(obj: &Object, key: &str) -> Option<String> {
    obj.get(key)?.as_str().map(str::to_owned)
}

/// Returns an identifier that the server may encode as a string or a number.
pub fn id(obj: &Object, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns an integer field, accepting integral floats and numeric strings.
pub fn int(obj: &Object, key: &str) -> Option<i64> {
    value_as_i64(obj.get(key)?)
}

/// Returns a floating point field.
pub fn float(obj: &Object, key: &str) -> Option<f64> {
    obj.get(key)?.as_f64()
}

/// Returns a boolean field.
pub fn boolean(obj: &Object, key: &str) -> Option<bool> {
    obj.get(key)?.as_bool()
}

/// Returns a nested object field.
pub fn object<'a>(obj: &'a Object, key: &str) -> Option<&'a Object> {
    obj.get(key)?.as_object()
}

/// Returns an array field.
pub fn array<'a>(obj: &'a Object, key: &str) -> Option<&'a Vec<Value>> {
    obj.get(key)?.as_array()
}

/// Converts a number or numeric string to `i64`.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
