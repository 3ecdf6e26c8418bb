// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pending mutations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One pending write waiting to be delivered to the remote store.
///
/// `key` is the caller-visible key, never the namespaced local key.
/// `value` may be `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub key: String,
    pub value: Value,
    pub namespace: String,
}

impl QueueEntry {
    pub fn new(key: impl Into<String>, value: Value, namespace: impl Into<String>) -> Self {
        QueueEntry {
            key: key.into(),
            value,
            namespace: namespace.into(),
        }
    }

    /// True if both entries address the same remote object.
    pub fn same_target(&self, other: &QueueEntry) -> bool {
        self.key == other.key && self.namespace == other.namespace
    }
}
