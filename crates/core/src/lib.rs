// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cs-core: Shared data model for the chatsync client
//!
//! This crate provides the chat entities, delta and history payload decoding,
//! and the WebSocket protocol frames used by cs-client and the chatsync CLI.

pub mod chat;
pub mod delta;
pub mod error;
pub mod history;
pub mod id;
pub mod json;
pub mod message;
pub mod protocol;
pub mod revision;

pub use chat::{ChatItem, ChatState, Department, OnlineStatus, Operator, OperatorRating, VisitSessionState};
pub use delta::{Delta, DeltaBody, DeltaEvent, DeltaResponse, FullUpdate, ObjectType};
pub use error::{Decoded, Error, Result};
pub use history::HistoryPage;
pub use id::ClientSideIdGenerator;
pub use message::{HistoryMessage, MessageIdentity, MessageKind};
pub use protocol::{Action, ClientFrame, Parameter, ServerErrorCode, ServerFrame, ServerPath};
pub use revision::{ClockSource, Revision, SystemClock};
