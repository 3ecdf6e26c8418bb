// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is request/response:
//! - Client sends one `set_item` per queued write and waits for its result
//! - Server answers each `set_item` with a `set_item_result` echoing the key

use serde::{Deserialize, Serialize};

use crate::entry::QueueEntry;

/// Result code the server returns for an accepted write.
pub const RESULT_OK: &str = "ok";

/// Body of a single write request.
///
/// `value` carries the JSON-serialized value so the server can validate and
/// store it without knowing its shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetItemRequest {
    pub key: String,
    pub value: String,
    pub namespace: String,
}

impl From<&QueueEntry> for SetItemRequest {
    fn from(entry: &QueueEntry) -> Self {
        SetItemRequest {
            key: entry.key.clone(),
            value: entry.value.to_string(),
            namespace: entry.namespace.clone(),
        }
    }
}

/// Server answer to a [`SetItemRequest`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetItemResponse {
    /// `"ok"` or an error code such as `"err_bad_value"`.
    #[serde(alias = "return")]
    pub result: String,
    /// Key of the request this answers.
    pub key: String,
}

impl SetItemResponse {
    pub fn ok(key: impl Into<String>) -> Self {
        SetItemResponse {
            result: RESULT_OK.to_string(),
            key: key.into(),
        }
    }

    pub fn error(code: impl Into<String>, key: impl Into<String>) -> Self {
        SetItemResponse {
            result: code.into(),
            key: key.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == RESULT_OK
    }
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Store a value. Answered by [`ServerMessage::SetItemResult`].
    SetItem(SetItemRequest),

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Outcome of a `set_item` request.
    SetItemResult(SetItemResponse),

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// The server could not process a message at all.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    pub fn set_item(request: SetItemRequest) -> Self {
        ClientMessage::SetItem(request)
    }

    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    pub fn set_item_result(response: SetItemResponse) -> Self {
        ServerMessage::SetItemResult(response)
    }

    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
