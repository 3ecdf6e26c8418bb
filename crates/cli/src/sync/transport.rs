// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for delivering writes to the remote store.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Mock transports for unit testing

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use objsync_core::protocol::{ClientMessage, ServerMessage, SetItemRequest, SetItemResponse};
use tracing::debug;

/// Error type for transport operations.
///
/// Every variant means the outcome of a request is unknown.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// No response within the configured request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server could not process the message at all.
    #[error("server error: {0}")]
    Server(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Transport trait for request/response delivery of writes.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Connect to the remote server.
    fn connect(&mut self) -> TransportFuture<'_, ()>;

    /// Disconnect from the server.
    fn disconnect(&mut self) -> TransportFuture<'_, ()>;

    /// Send one write and wait for the server's answer.
    ///
    /// Connects first if needed. An `Ok` response may still carry an error
    /// code; `Err` means delivery is unknown.
    fn set_item(&mut self, request: SetItemRequest) -> TransportFuture<'_, SetItemResponse>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<WsStream, tokio_tungstenite::tungstenite::Message>,
    stream: futures_util::stream::SplitStream<WsStream>,
}

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    url: String,
    /// Per-request deadline. `None` waits indefinitely.
    request_timeout: Option<Duration>,
    /// The WebSocket connection, if connected.
    ws: Option<WebSocketConnection>,
}

impl WebSocketTransport {
    /// Create a new WebSocket transport for the given server URL.
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketTransport {
            url: url.into(),
            request_timeout: None,
            ws: None,
        }
    }

    /// Bound every `set_item` round trip by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn ensure_connected(&mut self) -> TransportResult<()> {
        if self.ws.is_some() {
            return Ok(());
        }

        use futures_util::StreamExt;

        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let (sink, stream) = ws_stream.split();
        self.ws = Some(WebSocketConnection { sink, stream });
        debug!("connected to {}", self.url);
        Ok(())
    }

    async fn round_trip(&mut self, request: SetItemRequest) -> TransportResult<SetItemResponse> {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::Message;

        self.ensure_connected().await?;
        let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

        let json = ClientMessage::set_item(request)
            .to_json()
            .map_err(|e| TransportError::SerializationError(e.to_string()))?;

        ws.sink
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;

        loop {
            match ws.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let msg = ServerMessage::from_json(&text)
                        .map_err(|e| TransportError::SerializationError(e.to_string()))?;
                    match msg {
                        ServerMessage::SetItemResult(response) => return Ok(response),
                        ServerMessage::Error { message } => {
                            return Err(TransportError::Server(message))
                        }
                        ServerMessage::Pong { .. } => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Err(TransportError::ConnectionClosed),
                Some(Ok(_)) => {
                    // Ignore ping/pong and binary frames
                    continue;
                }
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
            }
        }
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(self.ensure_connected())
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                use futures_util::SinkExt;
                let _ = ws.sink.close().await;
            }
            Ok(())
        })
    }

    fn set_item(&mut self, request: SetItemRequest) -> TransportFuture<'_, SetItemResponse> {
        Box::pin(async move {
            let result = match self.request_timeout {
                Some(limit) => tokio::time::timeout(limit, self.round_trip(request))
                    .await
                    .unwrap_or(Err(TransportError::Timeout(limit))),
                None => self.round_trip(request).await,
            };
            if result.is_err() {
                // The stream may hold a late answer to this request; never reuse it.
                self.ws = None;
            }
            result
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}
