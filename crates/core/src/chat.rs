// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Chat, operator and department entities.
//!
//! Decoding is plain field extraction; anything missing or mistyped is
//! left unset.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::json::{self, Object};
use crate::message::{decode_messages, HistoryMessage};

/// State of the current chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    Chatting,
    ChattingWithRobot,
    Closed,
    ClosedByOperator,
    ClosedByVisitor,
    Invitation,
    Queue,
    #[default]
    Unknown,
}

impl ChatState {
    /// Parses the wire representation. Unrecognized states map to `Unknown`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "chatting" => ChatState::Chatting,
            "chatting_with_robot" => ChatState::ChattingWithRobot,
            "closed" => ChatState::Closed,
            "closed_by_operator" => ChatState::ClosedByOperator,
            "closed_by_visitor" => ChatState::ClosedByVisitor,
            "invitation" => ChatState::Invitation,
            "queue" => ChatState::Queue,
            _ => ChatState::Unknown,
        }
    }

    /// Returns the wire representation.
    pub fn as_wire(&self) -> &'static str {
        match self {
            ChatState::Chatting => "chatting",
            ChatState::ChattingWithRobot => "chatting_with_robot",
            ChatState::Closed => "closed",
            ChatState::ClosedByOperator => "closed_by_operator",
            ChatState::ClosedByVisitor => "closed_by_visitor",
            ChatState::Invitation => "invitation",
            ChatState::Queue => "queue",
            ChatState::Unknown => "unknown",
        }
    }

    /// Returns true if the chat is no longer attended by an operator.
    pub fn is_closed(&self) -> bool {
        matches!(self, ChatState::Closed | ChatState::Unknown)
    }
}

impl fmt::Display for ChatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// State of the visit session (independent of any chat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisitSessionState {
    Chat,
    DepartmentSelection,
    FirstQuestion,
    Idle,
    IdleAfterChat,
    OfflineMessage,
    #[default]
    Unknown,
}

impl VisitSessionState {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "chat" => VisitSessionState::Chat,
            "department-selection" => VisitSessionState::DepartmentSelection,
            "first-question" => VisitSessionState::FirstQuestion,
            "idle" => VisitSessionState::Idle,
            "idle-after-chat" => VisitSessionState::IdleAfterChat,
            "offline-message" => VisitSessionState::OfflineMessage,
            _ => VisitSessionState::Unknown,
        }
    }
}

/// Online status of the service or of a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OnlineStatus {
    BusyOffline,
    BusyOnline,
    Offline,
    Online,
    #[default]
    Unknown,
}

impl OnlineStatus {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "busy_offline" => OnlineStatus::BusyOffline,
            "busy_online" => OnlineStatus::BusyOnline,
            "offline" => OnlineStatus::Offline,
            "online" => OnlineStatus::Online,
            _ => OnlineStatus::Unknown,
        }
    }
}

/// An operator attending a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operator {
    pub id: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub department_keys: Vec<String>,
}

impl Operator {
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or(Error::NotAnObject("operator"))?;
        Ok(Operator {
            id: json::id(obj, "id").ok_or_else(|| Error::missing("operator", "id"))?,
            full_name: json::string(obj, "fullname").unwrap_or_default(),
            avatar: json::string(obj, "avatar"),
            department_keys: json::array(obj, "departmentKeys")
                .map(|keys| {
                    keys.iter()
                        .filter_map(|k| k.as_str().map(str::to_owned))
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

/// A department the visitor can address a chat to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Department {
    pub key: String,
    pub name: String,
    pub online_status: OnlineStatus,
    pub order: i64,
}

impl Department {
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or(Error::NotAnObject("department"))?;
        Ok(Department {
            key: json::string(obj, "key").ok_or_else(|| Error::missing("department", "key"))?,
            name: json::string(obj, "name").unwrap_or_default(),
            online_status: json::string(obj, "online")
                .map(|s| OnlineStatus::from_wire(&s))
                .unwrap_or_default(),
            order: json::int(obj, "order").unwrap_or(0),
        })
    }
}

/// Decodes a department list, skipping malformed entries.
pub fn decode_departments(values: &[Value]) -> (Vec<Department>, Vec<Error>) {
    let mut departments = Vec::new();
    let mut rejected = Vec::new();
    for value in values {
        match Department::from_json(value) {
            Ok(d) => departments.push(d),
            Err(e) => rejected.push(e),
        }
    }
    departments.sort_by_key(|d| d.order);
    (departments, rejected)
}

/// A visitor's rating of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperatorRating {
    pub rating: i64,
}

impl OperatorRating {
    /// Decodes `{operatorId, rating}`.
    pub fn from_json(value: &Value) -> Result<(String, Self)> {
        let obj = value.as_object().ok_or(Error::NotAnObject("rating"))?;
        let operator_id =
            json::id(obj, "operatorId").ok_or_else(|| Error::missing("rating", "operatorId"))?;
        let rating = json::int(obj, "rating").ok_or_else(|| Error::missing("rating", "rating"))?;
        Ok((operator_id, OperatorRating { rating }))
    }
}

/// The current chat as tracked from the delta stream.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChatItem {
    pub id: Option<String>,
    pub client_side_id: Option<String>,
    pub state: ChatState,
    pub operator: Option<Operator>,
    pub operator_typing: bool,
    pub read_by_visitor: bool,
    pub unread_by_visitor_msg_count: i64,
    pub unread_by_visitor_since_ts: Option<f64>,
    pub unread_by_operator_since_ts: Option<f64>,
    pub ratings: BTreeMap<String, OperatorRating>,
    /// Messages of the current chat, in arrival order.
    pub messages: Vec<HistoryMessage>,
}

impl ChatItem {
    /// Decodes a chat object. Malformed nested messages are reported in the
    /// second tuple element and skipped.
    pub fn from_json(value: &Value) -> Result<(Self, Vec<Error>)> {
        let obj = value.as_object().ok_or(Error::NotAnObject("chat"))?;
        let (messages, rejected) = json::array(obj, "messages")
            .map(|values| decode_messages(values))
            .unwrap_or_default();

        let chat = ChatItem {
            id: json::id(obj, "id"),
            client_side_id: json::string(obj, "clientSideId"),
            state: json::string(obj, "state")
                .map(|s| ChatState::from_wire(&s))
                .unwrap_or_default(),
            operator: json::present(obj, "operator").and_then(|v| Operator::from_json(v).ok()),
            operator_typing: json::boolean(obj, "operatorTyping").unwrap_or(false),
            read_by_visitor: json::boolean(obj, "readByVisitor").unwrap_or(false),
            unread_by_visitor_msg_count: json::int(obj, "unreadByVisitorMsgCnt").unwrap_or(0),
            unread_by_visitor_since_ts: json::float(obj, "unreadByVisitorSinceTs"),
            unread_by_operator_since_ts: json::float(obj, "unreadByOperatorSinceTs"),
            ratings: decode_ratings(obj),
            messages,
        };
        Ok((chat, rejected))
    }

    /// Returns the current-chat message referred to by `id`.
    pub fn message_mut(&mut self, id: &str) -> Option<&mut HistoryMessage> {
        self.messages.iter_mut().find(|m| m.has_id(id))
    }

    /// Inserts or replaces a message of the current chat.
    ///
    /// Returns true if the message was not known before.
    pub fn upsert_message(&mut self, message: HistoryMessage) -> bool {
        match self.messages.iter_mut().find(|m| m.is_same_message(&message)) {
            Some(existing) => {
                *existing = message;
                false
            }
            None => {
                self.messages.push(message);
                true
            }
        }
    }

    /// Removes a message of the current chat by server or client-side id.
    pub fn remove_message(&mut self, id: &str) -> Option<HistoryMessage> {
        let index = self.messages.iter().position(|m| m.has_id(id))?;
        Some(self.messages.remove(index))
    }

    /// Clears operator presence after the chat was closed.
    pub fn clear_operator_presence(&mut self) {
        self.operator = None;
        self.operator_typing = false;
    }
}

fn decode_ratings(obj: &Object) -> BTreeMap<String, OperatorRating> {
    let mut ratings = BTreeMap::new();
    if let Some(map) = json::object(obj, "operatorIdToRate") {
        for value in map.values() {
            if let Ok((operator_id, rating)) = OperatorRating::from_json(value) {
                ratings.insert(operator_id, rating);
            }
        }
    }
    ratings
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
