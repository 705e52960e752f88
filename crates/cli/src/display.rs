// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::DateTime;
use serde_json::{json, Value};

use cs_client::ApplyOutcome;
use cs_core::{ChatItem, HistoryMessage, MessageKind};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a microsecond timestamp as UTC, falling back to the raw number
/// when it is out of range.
pub fn format_timestamp(micros: i64) -> String {
    match DateTime::from_timestamp_micros(micros) {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => micros.to_string(),
    }
}

/// Name shown in front of a message.
fn author(message: &HistoryMessage) -> &str {
    if message.kind.is_from_visitor() {
        return "you";
    }
    match (&message.sender_name, message.kind) {
        (Some(name), _) if !name.is_empty() => name,
        (_, MessageKind::Operator) => "operator",
        (_, kind) => kind.as_wire(),
    }
}

/// One line per message: `[time] author: text`, with a marker for
/// messages not yet acknowledged by the server.
pub fn format_message(message: &HistoryMessage) -> String {
    let pending = if message.internal_id.is_none() {
        " (sending)"
    } else {
        ""
    };
    format!(
        "[{}] {}: {}{}",
        format_timestamp(message.time_in_microsecond),
        author(message),
        message.text,
        pending
    )
}

pub fn format_messages_json(messages: &[HistoryMessage]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(messages)
}

/// Summary line for one applied (or skipped) batch.
pub fn format_outcome(outcome: &ApplyOutcome, chat: Option<&ChatItem>) -> String {
    match outcome {
        ApplyOutcome::Applied(report) => {
            let mut line = format!("revision {}", report.revision);
            if report.full_update {
                line.push_str(" (full update)");
            }
            if let Some(chat) = chat {
                line.push_str(&format!(", chat {}", chat.state.as_wire()));
                if let Some(operator) = &chat.operator {
                    line.push_str(&format!(", operator {}", operator.full_name));
                }
                if chat.operator_typing {
                    line.push_str(", typing");
                }
            }
            if report.skipped > 0 {
                line.push_str(&format!(", {} skipped", report.skipped));
            }
            line
        }
        ApplyOutcome::Redundant { revision, last } => match last {
            Some(last) => format!("revision {} ignored (already at {})", revision, last),
            None => format!("revision {} ignored", revision),
        },
    }
}

pub fn outcome_json(outcome: &ApplyOutcome, chat: Option<&ChatItem>) -> Value {
    match outcome {
        ApplyOutcome::Applied(report) => json!({
            "applied": true,
            "revision": report.revision,
            "full_update": report.full_update,
            "skipped": report.skipped,
            "history_revision": report.history_revision,
            "chat": chat,
        }),
        ApplyOutcome::Redundant { revision, last } => json!({
            "applied": false,
            "revision": revision,
            "last": last,
        }),
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
