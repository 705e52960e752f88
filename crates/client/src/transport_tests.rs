// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the transport module.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use serde_json::json;
use tokio::net::TcpListener;
use yare::parameterized;

/// How the test server answers action frames.
#[derive(Clone, Copy)]
enum Behavior {
    /// Answer every request, echoing its params.
    Echo,
    /// Push one delta, then answer like `Echo`.
    DeltaFirst,
    /// Read requests but never answer.
    Silent,
    /// Close the socket on the first request.
    Hangup,
}

/// Starts a single-connection server and returns its URL.
async fn start_server(behavior: Behavior) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let (mut sink, mut stream) = ws.split();

        if let Behavior::DeltaFirst = behavior {
            let frame = ServerFrame::delta(json!({ "revision": 1, "deltaList": [] }));
            sink.send(Message::Text(frame.to_json().unwrap().into()))
                .await
                .unwrap();
        }

        while let Some(Ok(msg)) = stream.next().await {
            let Message::Text(text) = msg else { continue };
            let Ok(ClientFrame::Action { id, path, params }) = ClientFrame::from_json(&text) else {
                continue;
            };
            match behavior {
                Behavior::Silent => continue,
                Behavior::Hangup => {
                    let _ = sink.close().await;
                    return;
                }
                Behavior::Echo | Behavior::DeltaFirst => {
                    let body = json!({ "result": "ok", "path": path, "echo": params });
                    let reply = ServerFrame::response(id, body).to_json().unwrap();
                    if sink.send(Message::Text(reply.into())).await.is_err() {
                        return;
                    }
                }
            }
        }
    });

    format!("ws://{addr}")
}

fn request(message: &str) -> TransportRequest {
    let mut params = Map::new();
    params.insert("message".into(), json!(message));
    TransportRequest {
        path: ServerPath::Action,
        params,
    }
}

#[tokio::test]
async fn test_websocket_request_response() {
    let url = start_server(Behavior::Echo).await;
    let transport = WebSocketTransport::connect(&url, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(transport.is_connected());

    let body = transport.send(request("hello")).await.unwrap();
    assert_eq!(body["echo"]["message"], "hello");
    assert_eq!(body["path"], "/l/v/m/action");
}

#[tokio::test]
async fn test_websocket_concurrent_requests_are_correlated() {
    let url = start_server(Behavior::Echo).await;
    let transport = WebSocketTransport::connect(&url, Duration::from_secs(5))
        .await
        .unwrap();

    let (a, b, c) = tokio::join!(
        transport.send(request("a")),
        transport.send(request("b")),
        transport.send(request("c")),
    );
    assert_eq!(a.unwrap()["echo"]["message"], "a");
    assert_eq!(b.unwrap()["echo"]["message"], "b");
    assert_eq!(c.unwrap()["echo"]["message"], "c");
}

#[tokio::test]
async fn test_websocket_delta_feed() {
    let url = start_server(Behavior::DeltaFirst).await;
    let transport = WebSocketTransport::connect(&url, Duration::from_secs(5))
        .await
        .unwrap();

    let mut feed = transport.take_delta_feed().unwrap();
    assert!(transport.take_delta_feed().is_none());

    let batch = feed.recv().await.unwrap();
    assert_eq!(batch["revision"], 1);
}

#[tokio::test]
async fn test_websocket_timeout() {
    let url = start_server(Behavior::Silent).await;
    let transport = WebSocketTransport::connect(&url, Duration::from_millis(50))
        .await
        .unwrap();

    let err = transport.send(request("anyone?")).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout);
    assert!(transport.pending.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_websocket_connection_lost() {
    let url = start_server(Behavior::Hangup).await;
    let transport = WebSocketTransport::connect(&url, Duration::from_secs(5))
        .await
        .unwrap();

    let err = transport.send(request("bye")).await.unwrap_err();
    assert_eq!(err, TransportError::ConnectionLost);

    // Wait for the reader to observe the close.
    for _ in 0..50 {
        if !transport.is_connected() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!transport.is_connected());
    let err = transport.send(request("again")).await.unwrap_err();
    assert_eq!(err, TransportError::ConnectionLost);
}

#[tokio::test]
async fn test_websocket_connect_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = WebSocketTransport::connect(&format!("ws://{addr}"), Duration::from_secs(1)).await;
    assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
}

#[test]
fn test_route_frame_drops_unknown_response() {
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel();

    route_frame(r#"{"type":"response","id":99,"body":{}}"#, &pending, &delta_tx);
    route_frame("not json", &pending, &delta_tx);
    route_frame(r#"{"type":"delta","body":{"revision":3}}"#, &pending, &delta_tx);

    assert_eq!(delta_rx.try_recv().unwrap(), json!({ "revision": 3 }));
    assert!(delta_rx.try_recv().is_err());
}

#[parameterized(
    timeout = { TransportError::Timeout, true },
    lost = { TransportError::ConnectionLost, true },
    send_failed = { TransportError::SendFailed("broken pipe".into()), true },
    connect_failed = { TransportError::ConnectionFailed("refused".into()), false },
    serialization = { TransportError::Serialization("bad".into()), false },
)]
fn test_transient_errors(err: TransportError, transient: bool) {
    assert_eq!(err.is_transient(), transient);
}
