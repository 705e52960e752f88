// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[test]
fn revision_ordering() {
    assert!(Revision::new(13) > Revision::new(12));
    assert_eq!(Revision::new(12), Revision::new(12));
}

#[parameterized(
    nothing_applied = { 1, None, true },
    older = { 11, Some(12), false },
    same = { 12, Some(12), false },
    newer = { 13, Some(12), true },
)]
fn revision_is_newer_than(value: i64, last: Option<i64>, expected: bool) {
    let last = last.map(Revision::new);
    assert_eq!(Revision::new(value).is_newer_than(last), expected);
}

#[test]
fn revision_from_json_number_and_string() {
    assert_eq!(Revision::from_json(&json!(12)).unwrap(), Revision::new(12));
    assert_eq!(
        Revision::from_json(&json!("1519046942029554")).unwrap(),
        Revision::new(1_519_046_942_029_554)
    );
}

#[parameterized(
    null = { Value::Null },
    text = { json!("twelve") },
    object = { json!({ "revision": 1 }) },
)]
fn revision_from_json_rejects(value: Value) {
    assert!(matches!(
        Revision::from_json(&value),
        Err(Error::InvalidRevision(_))
    ));
}

#[test]
fn revision_display_roundtrip() {
    let rev: Revision = "42".parse().unwrap();
    assert_eq!(rev.to_string(), "42");
    assert!("x42".parse::<Revision>().is_err());
}

#[test]
fn system_clock_is_after_2020() {
    // 2020-01-01T00:00:00Z in microseconds.
    assert!(SystemClock.now_micros() > 1_577_836_800_000_000);
}
