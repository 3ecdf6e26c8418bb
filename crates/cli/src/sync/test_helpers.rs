// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use objsync_core::{KvStore, MemoryStore};

use super::store::{ObjStore, SyncConfig};
use super::transport_tests::MockTransport;
use super::worker::FlushEvent;

/// Unbounded in-memory storage.
pub fn memory_store() -> Arc<dyn KvStore> {
    Arc::new(MemoryStore::new())
}

/// Config that never flushes on its own.
pub fn manual_config() -> SyncConfig {
    SyncConfig {
        flush_on_write: false,
        flush_on_open: false,
        ..SyncConfig::default()
    }
}

/// Open a handle over `store` that talks to a clone of `transport`.
pub fn open_with(store: &Arc<dyn KvStore>, transport: &MockTransport) -> ObjStore<MockTransport> {
    ObjStore::with_transport(&manual_config(), Arc::clone(store), transport.clone()).unwrap()
}

/// Collect every completion event the handle reports.
pub fn record_events(objstore: &ObjStore<MockTransport>) -> Arc<Mutex<Vec<FlushEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    objstore.on_mutation_flushed(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

/// Yield to spawned tasks until `done` holds, failing after a few seconds.
pub async fn wait_until<F>(mut done: F)
where
    F: FnMut() -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    if waited.is_err() {
        panic!("condition not reached in time");
    }
}

/// Run `fut` to completion, failing after a few seconds.
pub async fn within<T>(fut: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .unwrap_or_else(|_| panic!("timed out"))
}
