// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Chat and history messages.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{Error, Result};
use crate::json;

const ENTITY: &str = "message";

/// The kind of a message, as reported by the server in the `kind` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    ActionRequest,
    ContactsRequest,
    Contacts,
    FileFromOperator,
    FileFromVisitor,
    ForOperator,
    Info,
    Keyboard,
    KeyboardResponse,
    Operator,
    OperatorBusy,
    StickerVisitor,
    Visitor,
    Unknown,
}

impl MessageKind {
    /// Parses the wire representation. Unrecognized kinds map to `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "action_request" => MessageKind::ActionRequest,
            "cont_req" => MessageKind::ContactsRequest,
            "contacts" => MessageKind::Contacts,
            "file_operator" => MessageKind::FileFromOperator,
            "file_visitor" => MessageKind::FileFromVisitor,
            "for_operator" => MessageKind::ForOperator,
            "info" => MessageKind::Info,
            "keyboard" => MessageKind::Keyboard,
            "keyboard_response" => MessageKind::KeyboardResponse,
            "operator" => MessageKind::Operator,
            "operator_busy" => MessageKind::OperatorBusy,
            "sticker_visitor" => MessageKind::StickerVisitor,
            "visitor" => MessageKind::Visitor,
            _ => MessageKind::Unknown,
        }
    }

    /// Returns the wire representation.
    pub fn as_wire(&self) -> &'static str {
        match self {
            MessageKind::ActionRequest => "action_request",
            MessageKind::ContactsRequest => "cont_req",
            MessageKind::Contacts => "contacts",
            MessageKind::FileFromOperator => "file_operator",
            MessageKind::FileFromVisitor => "file_visitor",
            MessageKind::ForOperator => "for_operator",
            MessageKind::Info => "info",
            MessageKind::Keyboard => "keyboard",
            MessageKind::KeyboardResponse => "keyboard_response",
            MessageKind::Operator => "operator",
            MessageKind::OperatorBusy => "operator_busy",
            MessageKind::StickerVisitor => "sticker_visitor",
            MessageKind::Visitor => "visitor",
            MessageKind::Unknown => "unknown",
        }
    }

    /// Returns true for messages authored by the visitor.
    pub fn is_from_visitor(&self) -> bool {
        matches!(
            self,
            MessageKind::Visitor
                | MessageKind::FileFromVisitor
                | MessageKind::StickerVisitor
                | MessageKind::KeyboardResponse
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// The identity used to de-duplicate messages.
///
/// The server-side id wins when present; messages that were only seen
/// locally are known by their client-side id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MessageIdentity {
    Internal(String),
    ClientSide(String),
}

/// One message of the chat timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryMessage {
    /// Server-side id (`id`).
    pub internal_id: Option<String>,
    /// Client-generated id used to correlate a sent message with its echo.
    pub client_side_id: Option<String>,
    /// Ordering key.
    pub time_in_microsecond: i64,
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub text: String,
    pub kind: MessageKind,
    /// Opaque `data` payload (attachments, keyboards).
    pub raw_data: Option<Value>,
    pub edited: bool,
    pub read: bool,
}

impl HistoryMessage {
    /// Creates a message with only the fields needed for ordering and identity.
    pub fn new(internal_id: impl Into<String>, time_in_microsecond: i64, text: impl Into<String>) -> Self {
        HistoryMessage {
            internal_id: Some(internal_id.into()),
            client_side_id: None,
            time_in_microsecond,
            sender_id: None,
            sender_name: None,
            text: text.into(),
            kind: MessageKind::Visitor,
            raw_data: None,
            edited: false,
            read: false,
        }
    }

    /// Sets the client-side id.
    pub fn with_client_side_id(mut self, id: impl Into<String>) -> Self {
        self.client_side_id = Some(id.into());
        self
    }

    /// Sets the kind.
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Decodes a message object.
    ///
    /// A message needs a timestamp (`ts_m`, or `ts` in seconds) and at least
    /// one of `id` / `clientSideId`; everything else is optional.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or(Error::NotAnObject(ENTITY))?;

        let time_in_microsecond = json::int(obj, "ts_m")
            .or_else(|| json::float(obj, "ts").map(|secs| (secs * 1_000_000.0).round() as i64))
            .ok_or_else(|| Error::missing(ENTITY, "ts_m"))?;

        let internal_id = json::id(obj, "id");
        let client_side_id = json::string(obj, "clientSideId");
        if internal_id.is_none() && client_side_id.is_none() {
            return Err(Error::missing(ENTITY, "id"));
        }

        Ok(HistoryMessage {
            internal_id,
            client_side_id,
            time_in_microsecond,
            sender_id: json::id(obj, "authorId"),
            sender_name: json::string(obj, "name"),
            text: json::string(obj, "text").unwrap_or_default(),
            kind: json::string(obj, "kind")
                .map(|k| MessageKind::from_wire(&k))
                .unwrap_or(MessageKind::Unknown),
            raw_data: json::present(obj, "data").cloned(),
            edited: json::boolean(obj, "edited").unwrap_or(false),
            read: json::boolean(obj, "read").unwrap_or(false),
        })
    }

    /// Returns the de-duplication identity.
    pub fn identity(&self) -> Option<MessageIdentity> {
        match (&self.internal_id, &self.client_side_id) {
            (Some(id), _) => Some(MessageIdentity::Internal(id.clone())),
            (None, Some(id)) => Some(MessageIdentity::ClientSide(id.clone())),
            (None, None) => None,
        }
    }

    /// Returns true if both messages describe the same server-side object.
    ///
    /// Server ids are compared when both sides have one; otherwise the
    /// client-side ids decide, which matches a locally sent message with
    /// its server echo.
    pub fn is_same_message(&self, other: &HistoryMessage) -> bool {
        if let (Some(a), Some(b)) = (&self.internal_id, &other.internal_id) {
            return a == b;
        }
        matches!(
            (&self.client_side_id, &other.client_side_id),
            (Some(a), Some(b)) if a == b
        )
    }

    /// Returns true if this message is referred to by `id` (server or client-side).
    pub fn has_id(&self, id: &str) -> bool {
        self.internal_id.as_deref() == Some(id) || self.client_side_id.as_deref() == Some(id)
    }
}

/// Decodes an array of messages, collecting rejected entries.
pub fn decode_messages(values: &[Value]) -> (Vec<HistoryMessage>, Vec<Error>) {
    let mut messages = Vec::with_capacity(values.len());
    let mut rejected = Vec::new();
    for value in values {
        match HistoryMessage::from_json(value) {
            Ok(message) => messages.push(message),
            Err(e) => rejected.push(e),
        }
    }
    (messages, rejected)
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
