// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Applies delta batches to the local session state.
//!
//! A batch either carries a full snapshot, which replaces the state
//! wholesale, or a list of deltas applied in order. The batch revision is
//! recorded once the whole batch is in, and a batch whose revision is not
//! newer than the last one applied is skipped.
//!
//! The revision lives in memory next to the state it describes: a new
//! callback starts unset and accepts whatever the server pushes first.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, trace, warn};

use cs_core::chat::decode_departments;
use cs_core::{
    ChatItem, ChatState, Delta, DeltaBody, DeltaEvent, DeltaResponse, Department, FullUpdate,
    HistoryMessage, ObjectType, OnlineStatus, Operator, OperatorRating, Revision,
    VisitSessionState,
};

use crate::history::HistoryStorage;
use crate::store::{session_key, KeyValueStore};

/// Result of applying one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(ApplyReport),
    /// The batch was not newer than the last applied revision.
    Redundant {
        revision: Revision,
        last: Option<Revision>,
    },
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied(_))
    }
}

/// What an applied batch changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyReport {
    pub revision: Revision,
    pub full_update: bool,
    /// Number of deltas whose payload could not be decoded.
    pub skipped: usize,
    /// Set when the server announced a new history revision; history should
    /// be requested "since" the stored revision.
    pub history_revision: Option<String>,
}

/// Session state tracked from the delta stream.
#[derive(Debug, Clone, Default)]
struct State {
    revision: Option<Revision>,
    chat: Option<ChatItem>,
    departments: Vec<Department>,
    visit_session_state: VisitSessionState,
    online_status: OnlineStatus,
    visit_session_id: Option<String>,
    read_before_ts: Option<i64>,
}

impl State {
    /// The current chat, created empty if a delta refers to one before any
    /// snapshot arrived. `chat_id` fills in the id of such a chat.
    fn chat_mut(&mut self, chat_id: Option<&str>) -> &mut ChatItem {
        let chat = self.chat.get_or_insert_with(ChatItem::default);
        if chat.id.is_none() {
            chat.id = chat_id.map(str::to_owned);
        }
        chat
    }
}

/// Applies delta batches and exposes the resulting state.
pub struct DeltaCallback {
    state: Mutex<State>,
    history: Arc<dyn HistoryStorage>,
    store: Arc<dyn KeyValueStore>,
    read_before_key: String,
}

impl DeltaCallback {
    /// Creates a callback for `session`, restoring the read-before
    /// timestamp from `store`.
    pub fn new(
        session: &str,
        history: Arc<dyn HistoryStorage>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let read_before_key = session_key(session, "read_before_ts");
        let state = State {
            read_before_ts: load(store.as_ref(), &read_before_key),
            ..State::default()
        };
        DeltaCallback {
            state: Mutex::new(state),
            history,
            store,
            read_before_key,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Applies one batch.
    ///
    /// The state lock is held for the whole batch, so readers never observe
    /// a half-applied batch.
    pub fn apply(&self, response: DeltaResponse) -> ApplyOutcome {
        let mut state = self.state();
        let revision = response.revision;

        let report = match response.body {
            DeltaBody::FullUpdate(update) => self.apply_full(&mut state, revision, *update),
            DeltaBody::Deltas(deltas) => {
                if !revision.is_newer_than(state.revision) {
                    debug!(%revision, last = ?state.revision, "skipping stale delta batch");
                    return ApplyOutcome::Redundant {
                        revision,
                        last: state.revision,
                    };
                }
                let mut report = ApplyReport {
                    revision,
                    full_update: false,
                    skipped: 0,
                    history_revision: None,
                };
                for delta in &deltas {
                    self.apply_delta(&mut state, delta, &mut report);
                }
                debug!(%revision, count = deltas.len(), skipped = report.skipped, "applied delta batch");
                report
            }
        };

        state.revision = Some(revision);
        ApplyOutcome::Applied(report)
    }

    fn apply_full(&self, state: &mut State, revision: Revision, update: FullUpdate) -> ApplyReport {
        if let Some(chat) = &update.chat {
            for message in &chat.messages {
                self.history.upsert(message.clone());
            }
        }
        *state = State {
            revision: state.revision,
            chat: update.chat,
            departments: update.departments.unwrap_or_default(),
            visit_session_state: update.visit_session_state.unwrap_or_default(),
            online_status: update.online_status.unwrap_or_default(),
            visit_session_id: update.visit_session_id,
            read_before_ts: state.read_before_ts,
        };
        debug!(%revision, "applied full update");
        ApplyReport {
            revision,
            full_update: true,
            skipped: 0,
            history_revision: update.history_revision,
        }
    }

    fn apply_delta(&self, state: &mut State, delta: &Delta, report: &mut ApplyReport) {
        // Absent payloads never erase existing values.
        let data = delta.data.as_ref();
        if data.is_none() && delta.event != DeltaEvent::Delete {
            trace!(object = %delta.object_type, id = %delta.id, "delta without data");
            return;
        }

        let applied = match (&delta.object_type, delta.event, data) {
            (ObjectType::Chat, DeltaEvent::Delete, _) => {
                state.chat = None;
                Ok(())
            }
            (ObjectType::Chat, _, Some(data)) => self.replace_chat(state, data),
            (ObjectType::ChatMessage, DeltaEvent::Delete, _) => {
                if let Some(chat) = state.chat.as_mut() {
                    chat.remove_message(&delta.id);
                }
                self.history.remove(&delta.id);
                Ok(())
            }
            (ObjectType::ChatMessage, _, Some(data)) => HistoryMessage::from_json(data)
                .map(|message| {
                    self.history.upsert(message.clone());
                    state.chat_mut(None).upsert_message(message);
                })
                .map_err(|e| e.to_string()),
            (ObjectType::ChatMessageRead, DeltaEvent::Update, Some(Value::Bool(read))) => {
                self.mark_message_read(state, &delta.id, *read);
                Ok(())
            }
            (ObjectType::ChatOperator, DeltaEvent::Update, Some(data)) => {
                Operator::from_json(data)
                    .map(|operator| state.chat_mut(Some(&delta.id)).operator = Some(operator))
                    .map_err(|e| e.to_string())
            }
            (ObjectType::ChatOperatorTyping, DeltaEvent::Update, Some(Value::Bool(typing))) => {
                state.chat_mut(Some(&delta.id)).operator_typing = *typing;
                Ok(())
            }
            (ObjectType::ChatReadByVisitor, DeltaEvent::Update, Some(Value::Bool(read))) => {
                state.chat_mut(Some(&delta.id)).read_by_visitor = *read;
                Ok(())
            }
            (ObjectType::ChatState, DeltaEvent::Update, Some(Value::String(wire))) => {
                let chat = state.chat_mut(Some(&delta.id));
                chat.state = ChatState::from_wire(wire);
                if chat.state.is_closed() {
                    chat.clear_operator_presence();
                }
                Ok(())
            }
            (ObjectType::ChatUnreadByOperatorSinceTs, DeltaEvent::Update, Some(ts)) => {
                match ts.as_f64() {
                    Some(ts) => {
                        state.chat_mut(Some(&delta.id)).unread_by_operator_since_ts = Some(ts);
                        Ok(())
                    }
                    None => Err(format!("expected a timestamp, got {ts}")),
                }
            }
            (ObjectType::UnreadByVisitor, DeltaEvent::Update, Some(Value::Object(obj))) => {
                let chat = state.chat_mut(Some(&delta.id));
                if let Some(count) = obj.get("msgCnt").and_then(Value::as_i64) {
                    chat.unread_by_visitor_msg_count = count;
                }
                if let Some(ts) = obj.get("sinceTs").and_then(Value::as_f64) {
                    chat.unread_by_visitor_since_ts = Some(ts);
                }
                Ok(())
            }
            (ObjectType::OperatorRate, DeltaEvent::Update, Some(data)) => {
                OperatorRating::from_json(data)
                    .map(|(operator_id, rating)| {
                        state.chat_mut(Some(&delta.id)).ratings.insert(operator_id, rating);
                    })
                    .map_err(|e| e.to_string())
            }
            (ObjectType::DepartmentList, _, Some(Value::Array(values))) => {
                let (departments, rejected) = decode_departments(values);
                for e in &rejected {
                    warn!("skipping department: {}", e);
                }
                state.departments = departments;
                Ok(())
            }
            (ObjectType::VisitSessionState, DeltaEvent::Update, Some(Value::String(wire))) => {
                state.visit_session_state = VisitSessionState::from_wire(wire);
                Ok(())
            }
            (ObjectType::HistoryRevision, _, Some(data)) => match history_revision(data) {
                Some(revision) => {
                    report.history_revision = Some(revision);
                    Ok(())
                }
                None => Err(format!("expected a history revision, got {data}")),
            },
            (ObjectType::Unknown(name), _, _) => {
                trace!(object = %name, "ignoring delta of unknown type");
                Ok(())
            }
            (object, event, Some(data)) => {
                trace!(%object, ?event, %data, "ignoring delta");
                Ok(())
            }
            (_, _, None) => Ok(()),
        };

        if let Err(reason) = applied {
            report.skipped += 1;
            warn!(object = %delta.object_type, id = %delta.id, "skipping delta: {}", reason);
        }
    }

    fn replace_chat(&self, state: &mut State, data: &Value) -> Result<(), String> {
        let (chat, rejected) = ChatItem::from_json(data).map_err(|e| e.to_string())?;
        for e in &rejected {
            warn!("skipping chat message: {}", e);
        }
        for message in &chat.messages {
            self.history.upsert(message.clone());
        }
        state.chat = Some(chat);
        Ok(())
    }

    fn mark_message_read(&self, state: &mut State, id: &str, read: bool) {
        let Some(message) = state.chat.as_mut().and_then(|chat| chat.message_mut(id)) else {
            debug!(id, "read mark for unknown message");
            return;
        };
        message.read = read;
        let message = message.clone();
        let ts = message.time_in_microsecond;
        self.history.upsert(message);

        if read && state.read_before_ts.map_or(true, |current| current < ts) {
            state.read_before_ts = Some(ts);
            self.save(&self.read_before_key, &ts.to_string());
        }
    }

    fn save(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set_string(key, value) {
            warn!(key, "failed to persist session state: {}", e);
        }
    }

    /// Revision of the last applied batch.
    pub fn revision(&self) -> Option<Revision> {
        self.state().revision
    }

    /// Snapshot of the current chat.
    pub fn chat(&self) -> Option<ChatItem> {
        self.state().chat.clone()
    }

    pub fn departments(&self) -> Vec<Department> {
        self.state().departments.clone()
    }

    pub fn visit_session_state(&self) -> VisitSessionState {
        self.state().visit_session_state
    }

    pub fn online_status(&self) -> OnlineStatus {
        self.state().online_status
    }

    pub fn visit_session_id(&self) -> Option<String> {
        self.state().visit_session_id.clone()
    }

    /// Timestamp of the newest message the operator has read.
    pub fn read_before_ts(&self) -> Option<i64> {
        self.state().read_before_ts
    }
}

/// Accepts the revision either bare or as `{"revision": ...}`.
fn history_revision(data: &Value) -> Option<String> {
    match data {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(obj) => obj.get("revision").and_then(history_revision),
        _ => None,
    }
}

fn load<T: std::str::FromStr>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get_string(key) {
        Ok(value) => value.and_then(|v| v.parse().ok()),
        Err(e) => {
            warn!(key, "failed to load session state: {}", e);
            None
        }
    }
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;
