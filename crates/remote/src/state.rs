// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the object table and its write log for thread-safe access.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use objsync_core::jsonl;
use objsync_core::protocol::{SetItemRequest, SetItemResponse};
use objsync_core::Result;

/// Log file inside the data directory.
pub const OBJECTS_LOG: &str = "objects.jsonl";

pub const ERR_BAD_NAMESPACE: &str = "err_bad_namespace";
pub const ERR_BAD_KEY: &str = "err_bad_key";
pub const ERR_BAD_VALUE: &str = "err_bad_value";

/// One accepted write, as logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWrite {
    pub namespace: String,
    pub key: String,
    pub value: Value,
}

/// Check a request, returning the parsed value or the rejection code.
pub fn validate(request: &SetItemRequest) -> std::result::Result<Value, &'static str> {
    if request.namespace.is_empty() {
        return Err(ERR_BAD_NAMESPACE);
    }
    if request.key.is_empty() {
        return Err(ERR_BAD_KEY);
    }
    serde_json::from_str(&request.value).map_err(|_| ERR_BAD_VALUE)
}

/// Shared server state containing the object table.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// Latest value per (namespace, key). The write lock also serializes log appends.
    objects: RwLock<HashMap<(String, String), Value>>,
    /// Write log; `None` keeps everything in memory.
    log_path: Option<PathBuf>,
}

impl ServerState {
    /// Opens the state in `data_dir`, replaying any existing write log.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let log_path = data_dir.join(OBJECTS_LOG);

        let replay: jsonl::Replay<StoredWrite> = jsonl::replay(&log_path)?;
        if replay.torn_tail {
            jsonl::rewrite(&log_path, &replay.records)?;
        }

        let mut objects = HashMap::new();
        let replayed = replay.records.len();
        for write in replay.records {
            objects.insert((write.namespace, write.key), write.value);
        }
        info!(replayed, objects = objects.len(), "loaded {}", log_path.display());

        Ok(Self::with_objects(objects, Some(log_path)))
    }

    /// State with no write log.
    pub fn in_memory() -> Self {
        Self::with_objects(HashMap::new(), None)
    }

    fn with_objects(objects: HashMap<(String, String), Value>, log_path: Option<PathBuf>) -> Self {
        ServerState {
            inner: Arc::new(ServerStateInner {
                objects: RwLock::new(objects),
                log_path,
            }),
        }
    }

    /// Applies a write, or answers with the reason it was refused.
    ///
    /// An error means nothing was stored; the client should retry.
    pub async fn set_item(&self, request: SetItemRequest) -> Result<SetItemResponse> {
        let value = match validate(&request) {
            Ok(value) => value,
            Err(code) => {
                debug!(key = %request.key, code, "rejected write");
                return Ok(SetItemResponse::error(code, request.key));
            }
        };

        let write = StoredWrite {
            namespace: request.namespace,
            key: request.key,
            value,
        };

        let mut objects = self.inner.objects.write().await;
        if let Some(path) = &self.inner.log_path {
            jsonl::append(path, &write)?;
        }
        debug!(namespace = %write.namespace, key = %write.key, "stored write");
        let response = SetItemResponse::ok(write.key.clone());
        objects.insert((write.namespace, write.key), write.value);
        Ok(response)
    }

    /// Returns the stored value for `(namespace, key)`.
    pub async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let objects = self.inner.objects.read().await;
        objects
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.inner.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
