// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The ordered, de-duplicated message timeline.
//!
//! Messages arrive from three places: "before" pages (older history),
//! "since" pages (newer history and edits) and chat-message deltas. All of
//! them go through one merge rule:
//!
//! - a message whose identity is already stored replaces the stored content
//!   (last writer wins) and is re-positioned by its timestamp;
//! - a new message is inserted after the last stored message whose
//!   timestamp is not greater than its own.
//!
//! The timeline therefore stays sorted by `time_in_microsecond` with ties in
//! arrival order, and never holds two entries with the same identity.

use std::sync::Mutex;

use tracing::debug;

use cs_core::HistoryMessage;

/// Shared message timeline.
///
/// Every method takes `&self`; implementations serialize mutation and reads
/// internally so a snapshot always reflects every merge applied before it.
pub trait HistoryStorage: Send + Sync {
    /// Merges an older page and records whether even older pages remain.
    fn receive_history_before(&self, messages: Vec<HistoryMessage>, has_more: bool);

    /// Merges a newer page, removes `deleted` ids and stores the page's
    /// revision if it has one.
    fn receive_history_update(
        &self,
        messages: Vec<HistoryMessage>,
        deleted: &[String],
        revision: Option<String>,
    );

    /// Inserts or replaces one message.
    fn upsert(&self, message: HistoryMessage);

    /// Removes the message referred to by a server or client-side id.
    fn remove(&self, id: &str) -> bool;

    /// Marks every message up to `time_in_microsecond` as read.
    fn mark_read_before(&self, time_in_microsecond: i64);

    /// Snapshot of the whole timeline, oldest first.
    fn full_history(&self) -> Vec<HistoryMessage>;

    /// The `limit` newest messages, oldest first.
    fn latest(&self, limit: usize) -> Vec<HistoryMessage>;

    /// Up to `limit` messages immediately older than the message `id`,
    /// oldest first. Empty if `id` is unknown.
    fn before(&self, id: &str, limit: usize) -> Vec<HistoryMessage>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// False once a "before" page reported that no older messages exist.
    fn has_more_before(&self) -> bool;

    /// Revision of the newest applied "since" page.
    fn since_revision(&self) -> Option<String>;
}

#[derive(Debug)]
struct Window {
    messages: Vec<HistoryMessage>,
    has_more_before: bool,
    since_revision: Option<String>,
}

impl Window {
    fn merge(&mut self, message: HistoryMessage) {
        if let Some(index) = self.messages.iter().position(|m| m.is_same_message(&message)) {
            self.messages.remove(index);
        }
        let at = self
            .messages
            .partition_point(|m| m.time_in_microsecond <= message.time_in_microsecond);
        self.messages.insert(at, message);
    }

    fn remove(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| !m.has_id(id));
        self.messages.len() != before
    }
}

/// In-memory timeline.
///
/// Pagination state lives with the messages it describes, so a fresh
/// timeline always starts with older pages unfetched.
pub struct MemoryHistoryStorage {
    window: Mutex<Window>,
}

impl MemoryHistoryStorage {
    pub fn new() -> Self {
        MemoryHistoryStorage {
            window: Mutex::new(Window {
                messages: Vec::new(),
                has_more_before: true,
                since_revision: None,
            }),
        }
    }

    fn window(&self) -> std::sync::MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryHistoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStorage for MemoryHistoryStorage {
    fn receive_history_before(&self, messages: Vec<HistoryMessage>, has_more: bool) {
        let count = messages.len();
        let mut window = self.window();
        for message in messages {
            window.merge(message);
        }
        window.has_more_before = has_more;
        drop(window);

        debug!(count, has_more, "merged history before page");
    }

    fn receive_history_update(
        &self,
        messages: Vec<HistoryMessage>,
        deleted: &[String],
        revision: Option<String>,
    ) {
        let count = messages.len();
        let mut window = self.window();
        for message in messages {
            window.merge(message);
        }
        for id in deleted {
            window.remove(id);
        }
        if let Some(revision) = &revision {
            window.since_revision = Some(revision.clone());
        }
        drop(window);

        debug!(count, deleted = deleted.len(), ?revision, "merged history since page");
    }

    fn upsert(&self, message: HistoryMessage) {
        self.window().merge(message);
    }

    fn remove(&self, id: &str) -> bool {
        self.window().remove(id)
    }

    fn mark_read_before(&self, time_in_microsecond: i64) {
        for message in self.window().messages.iter_mut() {
            if message.time_in_microsecond <= time_in_microsecond {
                message.read = true;
            }
        }
    }

    fn full_history(&self) -> Vec<HistoryMessage> {
        self.window().messages.clone()
    }

    fn latest(&self, limit: usize) -> Vec<HistoryMessage> {
        let window = self.window();
        let start = window.messages.len().saturating_sub(limit);
        window.messages[start..].to_vec()
    }

    fn before(&self, id: &str, limit: usize) -> Vec<HistoryMessage> {
        let window = self.window();
        match window.messages.iter().position(|m| m.has_id(id)) {
            Some(end) => window.messages[end.saturating_sub(limit)..end].to_vec(),
            None => Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.window().messages.len()
    }

    fn has_more_before(&self) -> bool {
        self.window().has_more_before
    }

    fn since_revision(&self) -> Option<String> {
        self.window().since_revision.clone()
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
