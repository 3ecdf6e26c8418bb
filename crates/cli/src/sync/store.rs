// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Host-facing key/value handle with background sync.
//!
//! Provides a high-level interface for:
//! - Instant local reads and writes
//! - Queuing every write for delivery to the remote store
//! - Flushing on demand or after each write
//! - Reporting sync health (pending count, completion hook)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use objsync_core::storage::read_json;
use objsync_core::{
    local_key, migrate, queue, Enqueued, KvStore, KvTxn, Namespacer, QueueEntry, WriteQueue,
};
use serde_json::Value;
use tracing::debug;

use super::transport::{Transport, TransportError, WebSocketTransport};
use super::worker::{DrainReport, FlushEvent, FlushWorker, WorkerState};

/// Configuration for the sync handle.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// URL of the remote server.
    pub url: String,
    /// Kick the worker after every successful write.
    pub flush_on_write: bool,
    /// Kick the worker once at open if writes are pending.
    pub flush_on_open: bool,
    /// Per-request deadline for the WebSocket transport.
    pub request_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            url: "ws://localhost:7890".to_string(),
            flush_on_write: false,
            flush_on_open: true,
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Error type for sync handle operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Local storage error.
    #[error(transparent)]
    Core(#[from] objsync_core::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for sync handle operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Local key/value store whose writes are queued for the remote store.
///
/// Construct one per storage and share it; there is no process-wide
/// default instance.
pub struct ObjStore<T: Transport = WebSocketTransport> {
    store: Arc<dyn KvStore>,
    namespacer: Namespacer,
    queue: WriteQueue,
    worker: FlushWorker<T>,
    flush_on_write: AtomicBool,
}

impl ObjStore<WebSocketTransport> {
    /// Open over `store`, delivering to `config.url` over WebSocket.
    pub fn open(config: &SyncConfig, store: Arc<dyn KvStore>) -> SyncResult<Self> {
        let transport = WebSocketTransport::new(config.url.as_str())
            .with_request_timeout(config.request_timeout);
        Self::with_transport(config, store, transport)
    }
}

impl<T: Transport + 'static> ObjStore<T> {
    /// Open over `store` with a custom transport (for testing).
    ///
    /// Migrates persisted state first.
    ///
    /// # Errors
    ///
    /// Fails with `SchemaTooNew` if the storage was written by a newer build.
    pub fn with_transport(
        config: &SyncConfig,
        store: Arc<dyn KvStore>,
        transport: T,
    ) -> SyncResult<Self> {
        migrate(&*store)?;

        let queue = WriteQueue::new(Arc::clone(&store));
        let objstore = ObjStore {
            namespacer: Namespacer::new(Arc::clone(&store)),
            worker: FlushWorker::new(queue.clone(), transport),
            queue,
            store,
            flush_on_write: AtomicBool::new(config.flush_on_write),
        };

        if config.flush_on_open && objstore.has_pending_writes()? {
            debug!("writes pending from a previous run");
            objstore.flush_now();
        }
        Ok(objstore)
    }

    /// Write `value` locally and queue it for the remote store.
    ///
    /// The local write and the enqueue commit together: on `StorageFull`
    /// neither the value nor the queue changes.
    pub fn set_item(
        &self,
        key: &str,
        value: Value,
        namespace: Option<&str>,
    ) -> SyncResult<Enqueued> {
        let namespace = self.namespacer.resolve(namespace)?;
        let slot = local_key(key, &namespace);
        let bytes = serde_json::to_vec(&value).map_err(objsync_core::Error::from)?;

        let mut entry = Some(QueueEntry::new(key, value, namespace));
        let mut outcome = Enqueued::Appended;
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            txn.put(&slot, &bytes)?;
            if let Some(entry) = entry.take() {
                outcome = queue::push_in(txn, entry)?;
            }
            Ok(())
        })?;

        if self.flush_on_write.load(Ordering::Acquire) {
            self.worker.kick();
        }
        Ok(outcome)
    }

    /// Read the local value. Never touches the network.
    pub fn get_item(&self, key: &str, namespace: Option<&str>) -> SyncResult<Option<Value>> {
        let slot = local_key(key, &self.namespacer.resolve(namespace)?);
        let mut value = None;
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            value = read_json(txn, &slot)?;
            Ok(())
        })?;
        Ok(value)
    }

    /// Delete the local value. The remote copy is left alone.
    pub fn remove_item(&self, key: &str, namespace: Option<&str>) -> SyncResult<()> {
        let slot = local_key(key, &self.namespacer.resolve(namespace)?);
        self.store.delete(&slot)?;
        Ok(())
    }

    pub fn has_pending_writes(&self) -> SyncResult<bool> {
        Ok(!self.queue.is_empty()?)
    }

    pub fn pending_write_count(&self) -> SyncResult<usize> {
        Ok(self.queue.len()?)
    }

    /// Pending writes, next to be sent first.
    pub fn pending_writes(&self) -> SyncResult<Vec<QueueEntry>> {
        Ok(self.queue.entries()?)
    }

    /// Register the completion hook, replacing any previous one.
    pub fn on_mutation_flushed<F>(&self, hook: F)
    where
        F: Fn(&FlushEvent) + Send + Sync + 'static,
    {
        self.worker.set_hook(Arc::new(hook));
    }

    /// Flush after every write from now on, starting with a flush now.
    pub fn enable_flush_on_write(&self) {
        self.flush_on_write.store(true, Ordering::Release);
        self.worker.kick();
    }

    pub fn disable_flush_on_write(&self) {
        self.flush_on_write.store(false, Ordering::Release);
    }

    pub fn flush_on_write(&self) -> bool {
        self.flush_on_write.load(Ordering::Acquire)
    }

    /// Start a background drain. See [`FlushWorker::kick`].
    pub fn flush_now(&self) -> bool {
        self.worker.kick()
    }

    /// Drain in the caller's task; `None` if a drain is already running.
    pub async fn flush(&self) -> Option<DrainReport> {
        self.worker.drain().await
    }

    pub fn installation_id(&self) -> SyncResult<String> {
        Ok(self.namespacer.installation_id()?)
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }

    /// Close the remote connection.
    pub async fn disconnect(&self) -> SyncResult<()> {
        Ok(self.worker.disconnect().await?)
    }
}
