// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test server utilities and tests for the WebSocket server.
//!
//! Provides a TestServer that runs on a random port for exercising the
//! server over real sockets.

#![allow(dead_code)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use yare::parameterized;

use objsync_core::protocol::{ClientMessage, ServerMessage, SetItemRequest, SetItemResponse};

use crate::server;
use crate::state::{self, ServerState};

/// A test server that runs on a random port and can be controlled.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    state: ServerState,
    /// Keep the temp directory alive for the lifetime of the test server.
    _temp_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a new test server on a random available port.
    pub async fn start() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = ServerState::new(temp_dir.path()).unwrap();

        // Bind to port 0 to get a random available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = server::serve(listener, state_clone) => {
                    if let Err(e) = result {
                        eprintln!("Test server error: {}", e);
                    }
                }
                _ = shutdown_rx => {}
            }
        });

        TestServer {
            addr,
            shutdown_tx,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get the WebSocket URL for connecting to this server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get access to the server state for verification.
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Shutdown the test server.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn request(key: &str, value: &str, namespace: &str) -> SetItemRequest {
    SetItemRequest {
        key: key.into(),
        value: value.into(),
        namespace: namespace.into(),
    }
}

/// Send one text frame and wait for the text answer.
async fn exchange(url: &str, frame: String) -> ServerMessage {
    let (ws_stream, _) = connect_async(url).await.unwrap();
    let (mut sink, mut stream) = ws_stream.split();
    sink.send(Message::Text(frame.into())).await.unwrap();

    match timeout(Duration::from_secs(5), stream.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => ServerMessage::from_json(&text).unwrap(),
        Ok(other) => panic!("Expected text response, got {:?}", other),
        Err(_) => panic!("Timeout waiting for response"),
    }
}

#[parameterized(
    missing_namespace = { "k", "1", "", state::ERR_BAD_NAMESPACE },
    missing_key = { "", "1", "ns", state::ERR_BAD_KEY },
    value_not_json = { "k", "{oops", "ns", state::ERR_BAD_VALUE },
)]
fn validate_rejects(key: &str, value: &str, namespace: &str, code: &'static str) {
    assert_eq!(state::validate(&request(key, value, namespace)), Err(code));
}

#[test]
fn validate_accepts_null_and_nested_values() {
    assert_eq!(state::validate(&request("k", "null", "ns")), Ok(json!(null)));
    assert_eq!(
        state::validate(&request("k", r#"{"a":[1,2]}"#, "ns")),
        Ok(json!({"a": [1, 2]}))
    );
}

#[tokio::test]
async fn set_item_is_acknowledged_and_stored() {
    let server = TestServer::start().await;

    let frame = ClientMessage::set_item(request("color", r#""blue""#, "ns-1"))
        .to_json()
        .unwrap();
    let response = exchange(&server.ws_url(), frame).await;

    assert_eq!(
        response,
        ServerMessage::set_item_result(SetItemResponse::ok("color"))
    );
    assert_eq!(server.state().get("ns-1", "color").await, Some(json!("blue")));

    server.shutdown();
}

#[tokio::test]
async fn invalid_write_is_rejected_with_code() {
    let server = TestServer::start().await;

    let frame = ClientMessage::set_item(request("color", "not json", "ns-1"))
        .to_json()
        .unwrap();
    let response = exchange(&server.ws_url(), frame).await;

    assert_eq!(
        response,
        ServerMessage::set_item_result(SetItemResponse::error(state::ERR_BAD_VALUE, "color"))
    );
    assert!(server.state().is_empty().await);

    server.shutdown();
}

#[tokio::test]
async fn writes_on_one_connection_are_answered_in_order() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.unwrap();
    let (mut sink, mut stream) = ws_stream.split();

    for (key, value) in [("a", "1"), ("b", "2"), ("a", "3")] {
        let frame = ClientMessage::set_item(request(key, value, "ns"))
            .to_json()
            .unwrap();
        sink.send(Message::Text(frame.into())).await.unwrap();
    }

    let mut acked = Vec::new();
    for _ in 0..3 {
        match timeout(Duration::from_secs(5), stream.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => match ServerMessage::from_json(&text).unwrap() {
                ServerMessage::SetItemResult(response) => acked.push(response.key),
                other => panic!("Expected set_item_result, got {:?}", other),
            },
            other => panic!("Expected text response, got {:?}", other),
        }
    }

    assert_eq!(acked, vec!["a", "b", "a"]);
    assert_eq!(server.state().get("ns", "a").await, Some(json!(3)));
    assert_eq!(server.state().len().await, 2);

    server.shutdown();
}

#[tokio::test]
async fn test_ping_pong() {
    let server = TestServer::start().await;

    let response = exchange(&server.ws_url(), ClientMessage::ping(42).to_json().unwrap()).await;
    assert_eq!(response, ServerMessage::pong(42));

    server.shutdown();
}

#[tokio::test]
async fn test_malformed_json_returns_error() {
    let server = TestServer::start().await;

    let response = exchange(&server.ws_url(), "not valid json".to_string()).await;
    assert!(matches!(response, ServerMessage::Error { .. }));

    server.shutdown();
}

#[tokio::test]
async fn test_websocket_ping_frame() {
    let server = TestServer::start().await;

    let (ws_stream, _) = connect_async(&server.ws_url()).await.unwrap();
    let (mut sink, mut stream) = ws_stream.split();

    // Raw WebSocket Ping frame, not a protocol ping
    sink.send(Message::Ping(vec![1, 2, 3].into())).await.unwrap();

    match timeout(Duration::from_secs(5), stream.next()).await {
        Ok(Some(Ok(Message::Pong(data)))) => assert_eq!(&data[..], &[1u8, 2, 3][..]),
        Ok(other) => panic!("Expected Pong frame, got {:?}", other),
        Err(_) => panic!("Timeout waiting for Pong frame"),
    }

    server.shutdown();
}

#[tokio::test]
async fn state_replays_log_after_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let state = ServerState::new(dir.path()).unwrap();
        state.set_item(request("a", "1", "ns")).await.unwrap();
        state.set_item(request("a", "2", "ns")).await.unwrap();
        state.set_item(request("b", "true", "other")).await.unwrap();
        state.set_item(request("", "1", "ns")).await.unwrap();
    }

    let state = ServerState::new(dir.path()).unwrap();
    assert_eq!(state.len().await, 2);
    assert_eq!(state.get("ns", "a").await, Some(json!(2)));
    assert_eq!(state.get("other", "b").await, Some(json!(true)));
}

#[tokio::test]
async fn state_recovers_from_torn_log_tail() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join(state::OBJECTS_LOG);
    std::fs::write(
        &log,
        "{\"namespace\":\"ns\",\"key\":\"a\",\"value\":1}\n{\"namespace\":\"ns\",\"ke",
    )
    .unwrap();

    let state = ServerState::new(dir.path()).unwrap();
    assert_eq!(state.get("ns", "a").await, Some(json!(1)));

    state.set_item(request("b", "2", "ns")).await.unwrap();
    drop(state);

    let state = ServerState::new(dir.path()).unwrap();
    assert_eq!(state.len().await, 2);
    assert_eq!(state.get("ns", "b").await, Some(json!(2)));
}

#[tokio::test]
async fn in_memory_state_writes_no_files() {
    let state = ServerState::in_memory();
    let response = state.set_item(request("a", "1", "ns")).await.unwrap();
    assert!(response.is_ok());
    assert_eq!(state.get("ns", "a").await, Some(json!(1)));
}
