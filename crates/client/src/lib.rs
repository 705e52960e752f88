// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cs-client: Session synchronization for the chatsync client
//!
//! This crate keeps a local chat session consistent with the remote service:
//! it queues and retries outbound actions, applies pushed delta batches in
//! revision order, pages message history into one ordered timeline and
//! tears everything down safely when the session is destroyed.

pub mod action_loop;
pub mod actions;
pub mod chat_session;
pub mod config;
pub mod delta;
pub mod error;
pub mod executor;
pub mod feed;
pub mod history;
pub mod session;
pub mod store;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use action_loop::{ActionError, ActionRequest, ActionRequestLoop, ActionResult, Lane, RetryPolicy};
pub use actions::ChatActions;
pub use chat_session::{open_store, ChatSession};
pub use config::{ClientConfig, ConfigError};
pub use delta::{ApplyOutcome, ApplyReport, DeltaCallback};
pub use error::{SessionError, SessionResult};
pub use executor::GuardedCallbackExecutor;
pub use feed::DeltaFeed;
pub use history::{HistoryStorage, MemoryHistoryStorage, RemoteHistoryProvider};
pub use session::SessionDestroyer;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};
pub use transport::{Transport, TransportError, WebSocketTransport};
