// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for cs-client tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::{mpsc, Notify};

use cs_core::{ClockSource, HistoryMessage};

use crate::transport::{Transport, TransportError, TransportRequest, TransportResult};

/// A scripted reply of the mock transport.
pub enum MockReply {
    Ok(Value),
    Err(TransportError),
    /// Waits for the notify before answering.
    Gated(Arc<Notify>, Value),
}

/// Mock transport for testing without real sockets.
///
/// Replies are consumed in call order; once the script is exhausted every
/// request gets `{"result": "ok"}`.
pub struct MockTransport {
    script: Mutex<VecDeque<MockReply>>,
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    delta_tx: mpsc::UnboundedSender<Value>,
    delta_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (delta_tx, delta_rx) = mpsc::unbounded_channel();
        MockTransport {
            script: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
            delta_tx,
            delta_rx: Mutex::new(Some(delta_rx)),
        }
    }

    /// Queues the reply for the next unanswered request.
    pub fn reply(&self, reply: MockReply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn reply_ok(&self, body: Value) {
        self.reply(MockReply::Ok(body));
    }

    pub fn reply_err(&self, err: TransportError) {
        self.reply(MockReply::Err(err));
    }

    /// Pushes a raw delta batch onto the delta feed. Ignored once the feed
    /// has been dropped.
    pub fn push_delta(&self, body: Value) {
        let _ = self.delta_tx.send(body);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Returns the values of `key` across all requests, in arrival order.
    pub fn sent_params(&self, key: &str) -> Vec<Value> {
        self.requests()
            .iter()
            .filter_map(|r| r.params.get(key).cloned())
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Value>> + Send + '_>> {
        self.requests.lock().unwrap().push(request);
        let reply = self.script.lock().unwrap().pop_front();
        Box::pin(async move {
            match reply {
                None => Ok(json!({ "result": "ok" })),
                Some(MockReply::Ok(body)) => Ok(body),
                Some(MockReply::Err(e)) => Err(e),
                Some(MockReply::Gated(gate, body)) => {
                    gate.notified().await;
                    Ok(body)
                }
            }
        })
    }

    fn take_delta_feed(&self) -> Option<mpsc::UnboundedReceiver<Value>> {
        self.delta_rx.lock().unwrap().take()
    }
}

/// Builds `count` messages with ids `"{prefix}{n}"` and timestamps
/// `base + n`.
pub fn messages(prefix: &str, base: i64, count: i64) -> Vec<HistoryMessage> {
    (0..count)
        .map(|n| HistoryMessage::new(format!("{prefix}{n}"), base + n, format!("text {n}")))
        .collect()
}

/// The delta batch at revision 12 captured from a live server.
pub fn revision_12_batch() -> Value {
    json!({
        "revision": 12,
        "deltaList": [
            {
                "id": "80a332f6fced40f290a5e8ace4a6d11c",
                "data": null,
                "event": "upd",
                "objectType": "CHAT_OPERATOR"
            },
            {
                "id": "80a332f6fced40f290a5e8ace4a6d11c",
                "data": "queue",
                "event": "upd",
                "objectType": "CHAT_STATE"
            },
            {
                "id": "80a332f6fced40f290a5e8ace4a6d11c_8",
                "data": {
                    "avatar": null,
                    "authorId": null,
                    "ts": 1519046868.2501681,
                    "sessionId": "80a332f6fced40f290a5e8ace4a6d11c",
                    "id": "80a332f6fced40f290a5e8ace4a6d11c_8",
                    "text": "11",
                    "clientSideId": "578150796321959ef8b445866738381b",
                    "kind": "visitor",
                    "name": "Никита"
                },
                "event": "add",
                "objectType": "CHAT_MESSAGE"
            }
        ]
    })
}

/// A "since" history response with two operator messages.
pub fn history_since_response() -> Value {
    json!({
        "result": "ok",
        "data": {
            "hasMore": true,
            "revision": "1519046942029554",
            "messages": [
                {
                    "authorId": 33201,
                    "data": null,
                    "id": "26066",
                    "ts_m": 1518178864048925_i64,
                    "text": "5",
                    "clientSideId": "2b29154364e14cf8b3823267740ac090",
                    "kind": "operator",
                    "name": "Administrator"
                },
                {
                    "authorId": 33201,
                    "data": null,
                    "id": "26068",
                    "ts_m": 1518181740640531_i64,
                    "text": "6",
                    "clientSideId": "ec1e7a6f8b1c4e1e93d3e04e7d69d83d",
                    "kind": "operator",
                    "name": "Administrator"
                }
            ]
        }
    })
}

/// A clock that always reads the same instant.
pub struct FixedClock(pub i64);

impl ClockSource for FixedClock {
    fn now_micros(&self) -> i64 {
        self.0
    }
}
