// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::action_loop::ActionError;
use crate::config::ConfigError;
use crate::test_helpers::{revision_12_batch, FixedClock, MockTransport};
use cs_core::{ChatState, Revision};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::oneshot;

fn session_with(transport: Arc<MockTransport>, store: Arc<dyn KeyValueStore>) -> ChatSession {
    let mut config = ClientConfig::new("ws://localhost:1");
    config.session_key = "visitor".into();
    ChatSession::with_clock(
        config,
        transport as Arc<dyn Transport>,
        store,
        Arc::new(FixedClock(5_000)),
    )
    .unwrap()
}

fn session() -> (Arc<MockTransport>, ChatSession) {
    let transport = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&transport), Arc::new(MemoryStore::new()));
    (transport, session)
}

async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert!(cond(), "condition not reached");
}

fn actions_sent(transport: &MockTransport) -> Vec<Value> {
    transport.sent_params("action")
}

#[tokio::test]
async fn pushed_batch_updates_state_and_subscribers() {
    let (transport, session) = session();
    let mut events = session.subscribe();

    transport.push_delta(revision_12_batch());

    let outcome = events.recv().await.unwrap();
    assert!(outcome.is_applied());
    assert_eq!(session.state().revision(), Some(Revision::new(12)));
    assert_eq!(session.state().chat().unwrap().state, ChatState::Queue);
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn history_revision_hint_requests_since_page() {
    let (transport, session) = session();
    transport.reply_ok(json!({
        "result": "ok",
        "data": { "hasMore": false, "revision": "99", "messages": [
            { "id": "h1", "ts_m": 10, "text": "from history", "kind": "operator" }
        ]}
    }));
    let mut events = session.subscribe();

    transport.push_delta(json!({
        "revision": 1,
        "deltaList": [{ "id": "h", "objectType": "HISTORY_REVISION", "event": "upd", "data": { "revision": "99" } }]
    }));
    events.recv().await.unwrap();

    let history = Arc::clone(session.history());
    wait_until(|| history.since_revision().as_deref() == Some("99")).await;
    assert_eq!(history.full_history()[0].text, "from history");
    assert!(transport.sent_params("since").is_empty());
}

#[tokio::test]
async fn send_message_starts_chat_when_none_is_open() {
    let (transport, session) = session();
    let (tx, rx) = oneshot::channel();

    session
        .send_message("hello", move |result| {
            let _ = tx.send(result);
        })
        .unwrap();
    rx.await.unwrap().unwrap();

    assert_eq!(
        actions_sent(&transport),
        vec![json!("chat.start"), json!("chat.message")]
    );
    assert_eq!(session.history().full_history()[0].time_in_microsecond, 5_000);
}

#[tokio::test]
async fn send_message_into_open_chat() {
    let (transport, session) = session();
    let mut events = session.subscribe();
    transport.push_delta(json!({
        "revision": 1,
        "deltaList": [{ "id": "c", "objectType": "CHAT_STATE", "event": "upd", "data": "chatting" }]
    }));
    events.recv().await.unwrap();

    let (tx, rx) = oneshot::channel();
    session
        .send_message("hello", move |result| {
            let _ = tx.send(result);
        })
        .unwrap();
    rx.await.unwrap().unwrap();

    assert_eq!(actions_sent(&transport), vec![json!("chat.message")]);
}

#[tokio::test]
async fn destroy_stops_the_session() {
    let (transport, session) = session();

    assert!(session.destroy());
    assert!(!session.destroy());
    assert!(session.is_destroyed());
    assert!(!session.requests().is_running());

    let err = session.actions().close_chat(|_| {}).unwrap_err();
    assert_eq!(err, ActionError::NotStarted);

    transport.push_delta(revision_12_batch());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.state().revision(), None);
}

#[tokio::test]
async fn destroy_and_clear_removes_persisted_state() {
    let transport = Arc::new(MockTransport::new());
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let session = session_with(Arc::clone(&transport), Arc::clone(&store));
    let mut events = session.subscribe();
    transport.push_delta(revision_12_batch());
    transport.push_delta(json!({
        "revision": 13,
        "deltaList": [{
            "id": "80a332f6fced40f290a5e8ace4a6d11c_8",
            "objectType": "CHAT_MESSAGE_READ",
            "event": "upd",
            "data": true
        }]
    }));
    events.recv().await.unwrap();
    events.recv().await.unwrap();
    assert!(store
        .get_string("visitor.read_before_ts")
        .unwrap()
        .is_some());

    session.destroy_and_clear().unwrap();

    assert!(session.is_destroyed());
    assert_eq!(store.get_string("visitor.read_before_ts").unwrap(), None);
}

#[tokio::test]
async fn restart_applies_pushes_from_a_fresh_connection() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let first = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&first), Arc::clone(&store));
    let mut events = session.subscribe();
    first.push_delta(revision_12_batch());
    events.recv().await.unwrap();
    drop(session);

    let second = Arc::new(MockTransport::new());
    let session = session_with(Arc::clone(&second), store);
    let mut events = session.subscribe();
    second.push_delta(revision_12_batch());

    assert!(events.recv().await.unwrap().is_applied());
    assert_eq!(session.state().revision(), Some(Revision::new(12)));
    assert_eq!(session.state().chat().unwrap().state, ChatState::Queue);
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn restart_starts_with_older_history_unfetched() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let first = Arc::new(MockTransport::new());
    first.reply_ok(json!({
        "result": "ok",
        "data": { "hasMore": false, "revision": "5", "messages": [
            { "id": "h1", "ts_m": 10, "text": "old", "kind": "operator" }
        ]}
    }));
    let session = session_with(Arc::clone(&first), Arc::clone(&store));
    session.history_provider().history_before(1_000).await.unwrap();
    assert!(!session.history().has_more_before());
    drop(session);

    let session = session_with(Arc::new(MockTransport::new()), store);

    assert!(session.history().is_empty());
    assert!(session.history().has_more_before());
    assert_eq!(session.history().since_revision(), None);
}

#[tokio::test]
async fn transport_without_feed_is_rejected() {
    let transport = Arc::new(MockTransport::new());
    transport.take_delta_feed();

    let result = ChatSession::new(
        ClientConfig::new("ws://localhost:1"),
        transport as Arc<dyn Transport>,
        Arc::new(MemoryStore::new()),
    );

    assert!(matches!(result, Err(SessionError::NoDeltaFeed)));
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let result = ChatSession::new(
        ClientConfig::new("http://localhost:1"),
        Arc::new(MockTransport::new()) as Arc<dyn Transport>,
        Arc::new(MemoryStore::new()),
    );

    assert!(matches!(
        result,
        Err(SessionError::Config(ConfigError::Invalid(_)))
    ));
}
