// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for talking to the chat service.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Mock transports for unit testing
//!
//! A transport does two things: it carries request/response exchanges for
//! the action and history paths, and it hands out the channel on which the
//! server pushes delta batches.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use cs_core::protocol::{ClientFrame, ServerFrame, ServerPath};

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection dropped before a response arrived.
    #[error("connection lost")]
    ConnectionLost,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// No response within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TransportError {
    /// Returns true for failures worth retrying on the same connection.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout | TransportError::ConnectionLost | TransportError::SendFailed(_)
        )
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// One request to the service.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub path: ServerPath,
    pub params: Map<String, Value>,
}

/// Request/response exchange plus the server's delta push channel.
pub trait Transport: Send + Sync {
    /// Sends a request and waits for the response body.
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Value>> + Send + '_>>;

    /// Takes the receiver of pushed delta batches.
    ///
    /// Returns `None` after the first call.
    fn take_delta_feed(&self) -> Option<mpsc::UnboundedReceiver<Value>>;
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// WebSocket transport implementation using tokio-tungstenite.
///
/// A writer task drains outgoing frames into the socket; a reader task
/// routes responses to their waiting request by id and forwards delta
/// frames to the delta feed. When the socket closes every waiting request
/// fails with [`TransportError::ConnectionLost`].
pub struct WebSocketTransport {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: PendingMap,
    next_id: AtomicU64,
    connected: Arc<AtomicBool>,
    deltas: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
    request_timeout: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl WebSocketTransport {
    /// Connects to `url` and starts the reader and writer tasks.
    pub async fn connect(url: &str, request_timeout: Duration) -> TransportResult<Self> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        let (mut sink, mut stream) = ws_stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (delta_tx, delta_rx) = mpsc::unbounded_channel();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));

        let writer_connected = Arc::clone(&connected);
        let writer = tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                if let Err(e) = sink.send(msg).await {
                    warn!("websocket send failed: {}", e);
                    break;
                }
            }
            writer_connected.store(false, Ordering::SeqCst);
            let _ = sink.close().await;
        });

        let reader_pending = Arc::clone(&pending);
        let reader_connected = Arc::clone(&connected);
        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => route_frame(&text, &reader_pending, &delta_tx),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("websocket receive failed: {}", e);
                        break;
                    }
                }
            }
            debug!("websocket closed");
            reader_connected.store(false, Ordering::SeqCst);
            // Dropping the senders fails every waiting request.
            reader_pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clear();
        });

        Ok(WebSocketTransport {
            outgoing,
            pending,
            next_id: AtomicU64::new(1),
            connected,
            deltas: Mutex::new(Some(delta_rx)),
            request_timeout,
            tasks: vec![writer, reader],
        })
    }

    /// Returns true while the socket is open.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn forget(&self, id: u64) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }
}

fn route_frame(text: &str, pending: &PendingMap, deltas: &mpsc::UnboundedSender<Value>) {
    match ServerFrame::from_json(text) {
        Ok(ServerFrame::Response { id, body }) => {
            let waiter = pending.lock().unwrap_or_else(|e| e.into_inner()).remove(&id);
            match waiter {
                Some(tx) => {
                    let _ = tx.send(body);
                }
                None => debug!(id, "response for unknown or expired request"),
            }
        }
        Ok(ServerFrame::Delta { body }) => {
            let _ = deltas.send(body);
        }
        Ok(ServerFrame::Pong { .. }) => {}
        Ok(ServerFrame::Error { message }) => warn!("server error frame: {}", message),
        Err(e) => warn!("undecodable server frame: {}", e),
    }
}

impl Transport for WebSocketTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Value>> + Send + '_>> {
        Box::pin(async move {
            if !self.is_connected() {
                return Err(TransportError::ConnectionLost);
            }

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let json = ClientFrame::action(id, request.path, request.params)
                .to_json()
                .map_err(|e| TransportError::Serialization(e.to_string()))?;

            let (tx, rx) = oneshot::channel();
            self.pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(id, tx);

            if let Err(e) = self.outgoing.send(Message::Text(json.into())) {
                self.forget(id);
                return Err(TransportError::SendFailed(e.to_string()));
            }

            match tokio::time::timeout(self.request_timeout, rx).await {
                Ok(Ok(body)) => Ok(body),
                Ok(Err(_)) => Err(TransportError::ConnectionLost),
                Err(_) => {
                    self.forget(id);
                    Err(TransportError::Timeout)
                }
            }
        })
    }

    fn take_delta_feed(&self) -> Option<mpsc::UnboundedReceiver<Value>> {
        self.deltas.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
