// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring of one chat session.
//!
//! [`ChatSession::new`] builds every component around one
//! [`SessionDestroyer`], starts the action loop and the delta feed, and
//! registers their shutdown as teardown. Destroying the session (explicitly
//! or by dropping it) stops all background work and silences every pending
//! completion.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use cs_core::{ClientSideIdGenerator, ClockSource, SystemClock};

use crate::action_loop::{ActionRequestLoop, ActionResult};
use crate::actions::ChatActions;
use crate::config::ClientConfig;
use crate::delta::{ApplyOutcome, DeltaCallback};
use crate::error::{SessionError, SessionResult};
use crate::executor::GuardedCallbackExecutor;
use crate::feed::{ApplyListener, DeltaFeed};
use crate::history::{HistoryStorage, MemoryHistoryStorage, RemoteHistoryProvider};
use crate::session::SessionDestroyer;
use crate::store::{session_key, KeyValueStore, MemoryStore, SqliteStore};
use crate::transport::{Transport, WebSocketTransport};

const EVENT_CAPACITY: usize = 64;

/// Keys a session persists, relative to its session key.
const PERSISTED_KEYS: &[&str] = &["read_before_ts"];

/// A running chat session.
pub struct ChatSession {
    config: ClientConfig,
    destroyer: Arc<SessionDestroyer>,
    requests: Arc<ActionRequestLoop>,
    store: Arc<dyn KeyValueStore>,
    history: Arc<dyn HistoryStorage>,
    provider: RemoteHistoryProvider,
    deltas: Arc<DeltaCallback>,
    actions: ChatActions,
    events: broadcast::Sender<ApplyOutcome>,
    _feed: Arc<DeltaFeed>,
}

impl ChatSession {
    /// Wires a session on top of `transport` and starts it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
    ) -> SessionResult<Self> {
        Self::with_clock(config, transport, store, Arc::new(SystemClock))
    }

    /// Like [`ChatSession::new`] with an explicit clock for message
    /// timestamps and client-side ids.
    pub fn with_clock(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn ClockSource>,
    ) -> SessionResult<Self> {
        config.validate()?;
        let feed = transport.take_delta_feed().ok_or(SessionError::NoDeltaFeed)?;
        let key = config.session_key.clone();

        let destroyer = Arc::new(SessionDestroyer::new(key.as_str()));
        let executor = GuardedCallbackExecutor::new(Arc::clone(&destroyer));
        let requests = Arc::new(ActionRequestLoop::new(
            transport,
            executor.clone(),
            config.retry_policy(),
            config.lane_concurrency,
        ));
        let history: Arc<dyn HistoryStorage> = Arc::new(MemoryHistoryStorage::new());
        let provider = RemoteHistoryProvider::new(Arc::clone(&requests), Arc::clone(&history));
        let deltas = Arc::new(DeltaCallback::new(
            &key,
            Arc::clone(&history),
            Arc::clone(&store),
        ));
        let actions = ChatActions::new(
            Arc::clone(&requests),
            Arc::clone(&history),
            Arc::new(ClientSideIdGenerator::new(key.as_str())),
            clock,
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let feed = Arc::new(DeltaFeed::spawn(
            feed,
            Arc::clone(&deltas),
            executor,
            on_apply(provider.clone(), events.clone()),
        ));

        let queue = requests.start();
        {
            let requests = Arc::clone(&requests);
            let feed = Arc::clone(&feed);
            destroyer.add(move || {
                requests.stop();
                feed.stop();
            });
        }
        info!(session = %key, %queue, "chat session started");

        Ok(ChatSession {
            config,
            destroyer,
            requests,
            store,
            history,
            provider,
            deltas,
            actions,
            events,
            _feed: feed,
        })
    }

    /// Connects to the configured WebSocket endpoint and starts a session
    /// with the configured store.
    pub async fn connect(config: ClientConfig) -> SessionResult<Self> {
        config.validate()?;
        let store = open_store(&config)?;
        let transport = WebSocketTransport::connect(&config.url, config.request_timeout()).await?;
        Self::new(config, Arc::new(transport), store)
    }

    pub fn key(&self) -> &str {
        self.destroyer.key()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn actions(&self) -> &ChatActions {
        &self.actions
    }

    pub fn history(&self) -> &Arc<dyn HistoryStorage> {
        &self.history
    }

    pub fn history_provider(&self) -> &RemoteHistoryProvider {
        &self.provider
    }

    /// Session state as tracked from the delta stream.
    pub fn state(&self) -> &DeltaCallback {
        &self.deltas
    }

    pub fn requests(&self) -> &Arc<ActionRequestLoop> {
        &self.requests
    }

    /// Receives the outcome of every delta batch applied from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ApplyOutcome> {
        self.events.subscribe()
    }

    /// Sends a message, starting a chat first if none is open.
    pub fn send_message(
        &self,
        text: &str,
        completion: impl FnOnce(ActionResult<serde_json::Value>) + Send + 'static,
    ) -> ActionResult<String> {
        let open = self
            .deltas
            .chat()
            .is_some_and(|chat| !chat.state.is_closed());
        if !open {
            debug!("no open chat, starting one");
            self.actions.start_chat(None, None, |result| {
                if let Err(e) = result {
                    warn!("failed to start chat: {}", e);
                }
            })?;
        }
        self.actions.send_message(text, None, completion)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyer.is_destroyed()
    }

    /// Stops all background work. Pending completions are suppressed.
    ///
    /// Returns false if the session was already destroyed.
    pub fn destroy(&self) -> bool {
        let first = self.destroyer.destroy();
        if first {
            info!(session = %self.key(), "chat session destroyed");
        }
        first
    }

    /// Destroys the session and removes everything it persisted.
    pub fn destroy_and_clear(&self) -> SessionResult<()> {
        self.destroy();
        for name in PERSISTED_KEYS {
            self.store.remove(&session_key(self.key(), name))?;
        }
        debug!(session = %self.key(), "persisted session state cleared");
        Ok(())
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Opens the configured store: SQLite when a path is set, memory otherwise.
pub fn open_store(config: &ClientConfig) -> SessionResult<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match &config.store_path {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Follows history revision hints and republishes every outcome.
fn on_apply(
    provider: RemoteHistoryProvider,
    events: broadcast::Sender<ApplyOutcome>,
) -> ApplyListener {
    Arc::new(move |outcome| {
        if let ApplyOutcome::Applied(report) = &outcome {
            let since = provider.storage().since_revision();
            if report.history_revision.is_some() && report.history_revision != since {
                let requested = provider.request_history_since(since, |result| {
                    if let Err(e) = result {
                        warn!("history since failed: {}", e);
                    }
                });
                if let Err(e) = requested {
                    warn!("could not request history since: {}", e);
                }
            }
        }
        // No subscribers is fine.
        let _ = events.send(outcome);
    })
}

#[cfg(test)]
#[path = "chat_session_tests.rs"]
mod tests;
