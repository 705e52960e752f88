// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use cs_client::ApplyReport;
use cs_core::{ChatState, Operator, Revision};
use yare::parameterized;

fn report(revision: i64) -> ApplyReport {
    ApplyReport {
        revision: Revision::new(revision),
        full_update: false,
        skipped: 0,
        history_revision: None,
    }
}

#[parameterized(
    epoch = { 0, "1970-01-01 00:00:00" },
    with_micros = { 1_519_046_942_029_554, "2018-02-19 13:29:02" },
)]
fn test_format_timestamp(micros: i64, expected: &str) {
    assert_eq!(format_timestamp(micros), expected);
}

#[test]
fn test_format_timestamp_out_of_range_falls_back() {
    assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
}

#[test]
fn test_format_message_authors() {
    let from_operator = HistoryMessage::new("m1", 0, "hello").with_kind(MessageKind::Operator);
    assert_eq!(format_message(&from_operator), "[1970-01-01 00:00:00] operator: hello");

    let mut named = from_operator.clone();
    named.sender_name = Some("Anna".into());
    assert_eq!(format_message(&named), "[1970-01-01 00:00:00] Anna: hello");

    let info = HistoryMessage::new("m2", 0, "chat started").with_kind(MessageKind::Info);
    assert_eq!(format_message(&info), "[1970-01-01 00:00:00] info: chat started");
}

#[test]
fn test_format_message_marks_unacknowledged_echo() {
    let mut echo = HistoryMessage::new("x", 0, "hi").with_kind(MessageKind::Visitor);
    echo.internal_id = None;
    assert_eq!(format_message(&echo), "[1970-01-01 00:00:00] you: hi (sending)");
}

#[test]
fn test_format_messages_json() {
    let messages = vec![HistoryMessage::new("m1", 5, "hello").with_kind(MessageKind::Operator)];
    let out = format_messages_json(&messages).unwrap();
    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed[0]["text"], "hello");
    assert_eq!(parsed[0]["kind"], "operator");
}

#[test]
fn test_format_outcome_applied() {
    let chat = ChatItem {
        state: ChatState::Chatting,
        operator: Some(Operator {
            id: "33201".into(),
            full_name: "Anna".into(),
            avatar: None,
            department_keys: Vec::new(),
        }),
        operator_typing: true,
        ..ChatItem::default()
    };
    let mut applied = report(7);
    applied.skipped = 2;

    let line = format_outcome(&ApplyOutcome::Applied(applied), Some(&chat));

    assert_eq!(line, "revision 7, chat chatting, operator Anna, typing, 2 skipped");
}

#[test]
fn test_format_outcome_redundant() {
    let outcome = ApplyOutcome::Redundant {
        revision: Revision::new(3),
        last: Some(Revision::new(5)),
    };
    assert_eq!(
        format_outcome(&outcome, None),
        "revision 3 ignored (already at 5)"
    );
}

#[test]
fn test_outcome_json() {
    let mut full = report(12);
    full.full_update = true;
    let value = outcome_json(&ApplyOutcome::Applied(full), None);

    assert_eq!(value["applied"], true);
    assert_eq!(value["revision"], 12);
    assert_eq!(value["full_update"], true);
    assert!(value["chat"].is_null());
}
