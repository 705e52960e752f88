// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delta batches pushed by the server.
//!
//! A batch carries a revision and either an ordered list of deltas or a full
//! state snapshot:
//!
//! ```text
//! {"revision": 12, "deltaList": [{"id", "objectType", "event", "data"}]}
//! {"revision": 13, "fullUpdate": {"chat": {...}, "departments": [...]}}
//! ```
//!
//! The envelope must carry a parseable revision. Individual deltas that fail
//! to decode are rejected without failing the batch.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::chat::{decode_departments, ChatItem, Department, OnlineStatus, VisitSessionState};
use crate::error::{Decoded, Error, Result};
use crate::json;
use crate::revision::Revision;

/// The kind of object a delta refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectType {
    Chat,
    ChatId,
    ChatMessage,
    ChatMessageRead,
    ChatOperator,
    ChatOperatorTyping,
    ChatReadByVisitor,
    ChatState,
    ChatUnreadByOperatorSinceTs,
    DepartmentList,
    HistoryRevision,
    OfflineChatMessage,
    OperatorRate,
    UnreadByVisitor,
    VisitSession,
    VisitSessionState,
    /// A type this client does not know; ignored on apply.
    Unknown(String),
}

impl ObjectType {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "CHAT" => ObjectType::Chat,
            "CHAT_ID" => ObjectType::ChatId,
            "CHAT_MESSAGE" => ObjectType::ChatMessage,
            "CHAT_MESSAGE_READ" => ObjectType::ChatMessageRead,
            "CHAT_OPERATOR" => ObjectType::ChatOperator,
            "CHAT_OPERATOR_TYPING" => ObjectType::ChatOperatorTyping,
            "CHAT_READ_BY_VISITOR" => ObjectType::ChatReadByVisitor,
            "CHAT_STATE" => ObjectType::ChatState,
            "CHAT_UNREAD_BY_OPERATOR_SINCE_TS" => ObjectType::ChatUnreadByOperatorSinceTs,
            "DEPARTMENT_LIST" => ObjectType::DepartmentList,
            "HISTORY_REVISION" => ObjectType::HistoryRevision,
            "OFFLINE_CHAT_MESSAGE" => ObjectType::OfflineChatMessage,
            "OPERATOR_RATE" => ObjectType::OperatorRate,
            "UNREAD_BY_VISITOR" => ObjectType::UnreadByVisitor,
            "VISIT_SESSION" => ObjectType::VisitSession,
            "VISIT_SESSION_STATE" => ObjectType::VisitSessionState,
            other => ObjectType::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Unknown(s) => write!(f, "{s}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// What happened to the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeltaEvent {
    Add,
    Update,
    Delete,
}

impl DeltaEvent {
    pub fn from_wire(s: &str) -> Result<Self> {
        match s {
            "add" => Ok(DeltaEvent::Add),
            "upd" => Ok(DeltaEvent::Update),
            "del" => Ok(DeltaEvent::Delete),
            other => Err(Error::InvalidEvent(other.to_string())),
        }
    }
}

/// One change record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub id: String,
    pub object_type: ObjectType,
    pub event: DeltaEvent,
    /// `None` when the server sent `null` or omitted the field.
    pub data: Option<Value>,
}

impl Delta {
    pub fn new(
        id: impl Into<String>,
        object_type: ObjectType,
        event: DeltaEvent,
        data: Option<Value>,
    ) -> Self {
        Delta {
            id: id.into(),
            object_type,
            event,
            data,
        }
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or(Error::NotAnObject("delta"))?;
        let event = json::string(obj, "event").ok_or_else(|| Error::missing("delta", "event"))?;
        Ok(Delta {
            id: json::id(obj, "id").ok_or_else(|| Error::missing("delta", "id"))?,
            object_type: json::string(obj, "objectType")
                .map(|s| ObjectType::from_wire(&s))
                .unwrap_or_else(|| ObjectType::Unknown(String::new())),
            event: DeltaEvent::from_wire(&event)?,
            data: json::present(obj, "data").cloned(),
        })
    }
}

/// A full snapshot of the session state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FullUpdate {
    pub chat: Option<ChatItem>,
    pub departments: Option<Vec<Department>>,
    pub visit_session_state: Option<VisitSessionState>,
    pub online_status: Option<OnlineStatus>,
    pub history_revision: Option<String>,
    pub visit_session_id: Option<String>,
    pub page_id: Option<String>,
}

impl FullUpdate {
    fn from_json(value: &Value, rejected: &mut Vec<Error>) -> Result<Self> {
        let obj = value.as_object().ok_or(Error::NotAnObject("fullUpdate"))?;

        let chat = match json::present(obj, "chat") {
            Some(v) => match ChatItem::from_json(v) {
                Ok((chat, bad)) => {
                    rejected.extend(bad);
                    Some(chat)
                }
                Err(e) => {
                    rejected.push(e);
                    None
                }
            },
            None => None,
        };

        let departments = json::array(obj, "departments").map(|values| {
            let (departments, bad) = decode_departments(values);
            rejected.extend(bad);
            departments
        });

        Ok(FullUpdate {
            chat,
            departments,
            visit_session_state: json::string(obj, "state")
                .map(|s| VisitSessionState::from_wire(&s)),
            online_status: json::string(obj, "onlineStatus").map(|s| OnlineStatus::from_wire(&s)),
            history_revision: json::id(obj, "historyRevision"),
            visit_session_id: json::string(obj, "visitSessionId"),
            page_id: json::string(obj, "pageId"),
        })
    }
}

/// The payload of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeltaBody {
    Deltas(Vec<Delta>),
    FullUpdate(Box<FullUpdate>),
}

/// One decoded batch of the delta feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaResponse {
    pub revision: Revision,
    pub body: DeltaBody,
}

impl DeltaResponse {
    pub fn deltas(revision: Revision, deltas: Vec<Delta>) -> Self {
        DeltaResponse {
            revision,
            body: DeltaBody::Deltas(deltas),
        }
    }

    pub fn full(revision: Revision, update: FullUpdate) -> Self {
        DeltaResponse {
            revision,
            body: DeltaBody::FullUpdate(Box::new(update)),
        }
    }

    /// Decodes a batch.
    ///
    /// Fails only if the envelope is not an object or has no parseable
    /// revision. A present `fullUpdate` takes precedence over `deltaList`;
    /// an absent `deltaList` is an empty batch.
    pub fn from_json(value: &Value) -> Result<Decoded<Self>> {
        let obj = value.as_object().ok_or(Error::NotAnObject("delta response"))?;
        let revision = match obj.get("revision") {
            Some(v) => Revision::from_json(v)?,
            None => return Err(Error::missing("delta response", "revision")),
        };

        let mut rejected = Vec::new();

        if let Some(full) = json::present(obj, "fullUpdate") {
            let update = FullUpdate::from_json(full, &mut rejected)?;
            return Ok(Decoded::new(
                DeltaResponse::full(revision, update),
                rejected,
            ));
        }

        let mut deltas = Vec::new();
        for item in json::array(obj, "deltaList").map(Vec::as_slice).unwrap_or_default() {
            match Delta::from_json(item) {
                Ok(delta) => deltas.push(delta),
                Err(e) => rejected.push(e),
            }
        }

        Ok(Decoded::new(DeltaResponse::deltas(revision, deltas), rejected))
    }

    /// Decodes a batch from its JSON text.
    pub fn parse(text: &str) -> Result<Decoded<Self>> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
