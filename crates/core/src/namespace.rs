// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Installation identity and key namespacing.
//!
//! Every installation writes into the shared remote store under its own
//! namespace: a random identifier generated on first use and persisted for
//! the life of the storage. Callers who know another installation's
//! namespace may pass it explicitly to share objects.

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::error::{Error, Result};
use crate::storage::{KvStore, KvTxn};

/// Slot holding the installation identifier.
pub const INSTALLATION_ID_SLOT: &str = ".objsync.installation_id";

/// Number of random bytes in a generated identifier.
const ID_BYTES: usize = 16;

/// Generate a fresh random installation identifier (32 lowercase hex chars).
pub fn generate_id() -> String {
    let bytes: [u8; ID_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Storage key used for the local copy of `key` in `namespace`.
///
/// Only used for local reads and writes; the wire carries key and namespace
/// separately.
pub fn local_key(key: &str, namespace: &str) -> String {
    format!("{namespace}-{key}")
}

/// Read the installation id inside a transaction, creating it if absent.
pub fn load_or_create_id(txn: &mut dyn KvTxn) -> Result<String> {
    if let Some(bytes) = txn.get(INSTALLATION_ID_SLOT)? {
        return String::from_utf8(bytes).map_err(|_| {
            Error::CorruptedData("installation id is not valid UTF-8".to_string())
        });
    }
    let id = generate_id();
    txn.put(INSTALLATION_ID_SLOT, id.as_bytes())?;
    info!("generated installation id {}", id);
    Ok(id)
}

/// Resolves the namespace for reads and writes.
pub struct Namespacer {
    store: Arc<dyn KvStore>,
    cached: OnceLock<String>,
}

impl Namespacer {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Namespacer {
            store,
            cached: OnceLock::new(),
        }
    }

    /// The installation id, generated and persisted on first access.
    pub fn installation_id(&self) -> Result<String> {
        if let Some(id) = self.cached.get() {
            return Ok(id.clone());
        }

        let mut id = String::new();
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            id = load_or_create_id(txn)?;
            Ok(())
        })?;

        // Another thread may have won the race; both read the same slot.
        Ok(self.cached.get_or_init(|| id).clone())
    }

    /// An explicit namespace wins; otherwise the installation id.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<String> {
        match explicit {
            Some(namespace) => Ok(namespace.to_string()),
            None => self.installation_id(),
        }
    }
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod tests;
