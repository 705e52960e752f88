// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol frames and action parameters.
//!
//! The client sends action requests addressed to one of the service paths;
//! the server answers each request with a response carrying the same id and
//! pushes delta batches unprompted:
//!
//! ```text
//! -> {"type":"action","id":7,"path":"/l/v/m/action","params":{"action":"chat.message",...}}
//! <- {"type":"response","id":7,"body":{"result":"ok"}}
//! <- {"type":"delta","body":{"revision":12,"deltaList":[...]}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Parameter keys understood by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    Action,
    BeforeTimestamp,
    ChatMode,
    ClientSideId,
    Data,
    DeleteDraft,
    DepartmentKey,
    Draft,
    FirstQuestion,
    ForceOnline,
    Message,
    OperatorId,
    PushToken,
    Rating,
    Since,
    VisitorTyping,
}

impl Parameter {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Parameter::Action => "action",
            Parameter::BeforeTimestamp => "before-ts",
            Parameter::ChatMode => "chat-mode",
            Parameter::ClientSideId => "client-side-id",
            Parameter::Data => "data",
            Parameter::DeleteDraft => "del-message-draft",
            Parameter::DepartmentKey => "department-key",
            Parameter::Draft => "message-draft",
            Parameter::FirstQuestion => "first-question",
            Parameter::ForceOnline => "force-online",
            Parameter::Message => "message",
            Parameter::OperatorId => "operator-id",
            Parameter::PushToken => "push-token",
            Parameter::Rating => "rate",
            Parameter::Since => "since",
            Parameter::VisitorTyping => "typing",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Actions submitted to the action path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CloseChat,
    RateOperator,
    SendMessage,
    SetPushToken,
    SetVisitorTyping,
    StartChat,
}

impl Action {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Action::CloseChat => "chat.close",
            Action::RateOperator => "chat.operator_rate_select",
            Action::SendMessage => "chat.message",
            Action::SetPushToken => "set_push_token",
            Action::SetVisitorTyping => "chat.visitor_typing",
            Action::StartChat => "chat.start",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Service endpoint a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerPath {
    #[serde(rename = "/l/v/m/action")]
    Action,
    #[serde(rename = "/l/v/m/history")]
    History,
}

/// Frames sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// A request to the service. Answered by a `Response` with the same id.
    Action {
        id: u64,
        path: ServerPath,
        params: Map<String, Value>,
    },

    /// Keepalive.
    Ping { id: u64 },
}

/// Frames sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Answer to the `Action` with the same id.
    Response { id: u64, body: Value },

    /// An unsolicited delta batch.
    Delta { body: Value },

    /// Echoed from the Ping frame.
    Pong { id: u64 },

    /// Connection-level failure. Not tied to a request.
    Error { message: String },
}

impl ClientFrame {
    pub fn action(id: u64, path: ServerPath, params: Map<String, Value>) -> Self {
        ClientFrame::Action { id, path, params }
    }

    pub fn ping(id: u64) -> Self {
        ClientFrame::Ping { id }
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerFrame {
    pub fn response(id: u64, body: Value) -> Self {
        ServerFrame::Response { id, body }
    }

    pub fn delta(body: Value) -> Self {
        ServerFrame::Delta { body }
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Error codes reported by the service in a response's `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServerErrorCode {
    AccountBlocked,
    OperatorNotInChat,
    ProvidedVisitorExpired,
    ReinitRequired,
    ServerNotReady,
    VisitorBanned,
    WrongProvidedVisitorHash,
    Other(String),
}

impl ServerErrorCode {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "account-blocked" => ServerErrorCode::AccountBlocked,
            "operator-not-in-chat" => ServerErrorCode::OperatorNotInChat,
            "provided-visitor-expired" => ServerErrorCode::ProvidedVisitorExpired,
            "reinit-required" => ServerErrorCode::ReinitRequired,
            "server-not-ready" => ServerErrorCode::ServerNotReady,
            "visitor-banned" => ServerErrorCode::VisitorBanned,
            "wrong-provided-visitor-hash-value" => ServerErrorCode::WrongProvidedVisitorHash,
            other => ServerErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            ServerErrorCode::AccountBlocked => "account-blocked",
            ServerErrorCode::OperatorNotInChat => "operator-not-in-chat",
            ServerErrorCode::ProvidedVisitorExpired => "provided-visitor-expired",
            ServerErrorCode::ReinitRequired => "reinit-required",
            ServerErrorCode::ServerNotReady => "server-not-ready",
            ServerErrorCode::VisitorBanned => "visitor-banned",
            ServerErrorCode::WrongProvidedVisitorHash => "wrong-provided-visitor-hash-value",
            ServerErrorCode::Other(s) => s,
        }
    }

    /// Reads the `error` field of a response body, if any.
    pub fn from_response(body: &Value) -> Option<Self> {
        body.get("error")?.as_str().map(Self::from_wire)
    }
}

impl fmt::Display for ServerErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
