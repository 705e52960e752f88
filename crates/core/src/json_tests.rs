// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

fn obj(value: Value) -> Object {
    value.as_object().unwrap().clone()
}

#[parameterized(
    integer = { json!(12), Some(12) },
    integral_float = { json!(12.0), Some(12) },
    fractional_float = { json!(12.5), None },
    numeric_string = { json!("1519046942029554"), Some(1_519_046_942_029_554) },
    garbage_string = { json!("abc"), None },
    null = { Value::Null, None },
    boolean = { json!(true), None },
)]
fn value_as_i64_cases(value: Value, expected: Option<i64>) {
    assert_eq!(value_as_i64(&value), expected);
}

#[test]
fn wrong_types_are_absent() {
    let o = obj(json!({ "text": 5, "read": "yes", "data": null, "ts": "soon" }));
    assert_eq!(string(&o, "text"), None);
    assert_eq!(boolean(&o, "read"), None);
    assert!(present(&o, "data").is_none());
    assert_eq!(float(&o, "ts"), None);
    assert_eq!(string(&o, "missing"), None);
}

#[test]
fn id_accepts_numbers_and_strings() {
    let o = obj(json!({ "a": 33201, "b": "26066", "c": [] }));
    assert_eq!(id(&o, "a").as_deref(), Some("33201"));
    assert_eq!(id(&o, "b").as_deref(), Some("26066"));
    assert_eq!(id(&o, "c"), None);
}

#[test]
fn nested_accessors() {
    let o = obj(json!({ "chat": { "id": 1 }, "list": [1, 2], "flag": false }));
    assert!(object(&o, "chat").is_some());
    assert_eq!(array(&o, "list").map(Vec::len), Some(2));
    assert_eq!(boolean(&o, "flag"), Some(false));
    assert!(object(&o, "list").is_none());
}
