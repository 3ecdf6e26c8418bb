// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background drain of the write queue.
//!
//! One [`FlushWorker`] per process drains the persisted queue head first,
//! one request at a time. An atomic flag is the whole state machine: a
//! caller that flips it from idle to draining owns the drain loop until it
//! flips it back, and everyone else's kick is a no-op.
//!
//! Outcomes per entry:
//!
//! | Response                 | Entry   | Loop     |
//! |--------------------------|---------|----------|
//! | `ok`, key matches        | popped  | continue |
//! | error code               | popped  | continue |
//! | `ok`, key differs        | kept    | stop     |
//! | transport error          | kept    | stop     |
//!
//! If the pop after a terminal outcome fails, the hook still hears the
//! outcome and the drain stops; the entry is still queued and is sent
//! again on the next drain, so delivery is at least once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use objsync_core::protocol::{SetItemRequest, SetItemResponse};
use objsync_core::{QueueEntry, WriteQueue};
use tracing::{debug, error, info, warn};

use super::transport::{Transport, TransportResult};

/// Terminal outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The remote store acknowledged the write.
    Acked,
    /// The remote store refused the payload; the entry was dropped.
    Rejected { code: String },
    /// No authoritative answer; the entry stays at the head.
    NetworkError(String),
    /// An `ok` answer for a different key; treated like a network error.
    ResponseMismatch { expected: String, received: String },
}

impl Delivery {
    /// Classify the transport's answer to a request for `key`.
    pub fn classify(key: &str, result: TransportResult<SetItemResponse>) -> Self {
        match result {
            Ok(response) if response.is_ok() && response.key == key => Delivery::Acked,
            Ok(response) if response.is_ok() => Delivery::ResponseMismatch {
                expected: key.to_string(),
                received: response.key,
            },
            Ok(response) => Delivery::Rejected {
                code: response.result,
            },
            Err(e) => Delivery::NetworkError(e.to_string()),
        }
    }

    /// True for every outcome except [`Delivery::Acked`].
    pub fn failed(&self) -> bool {
        !matches!(self, Delivery::Acked)
    }

    /// Whether the entry leaves the queue.
    fn is_terminal_for_entry(&self) -> bool {
        matches!(self, Delivery::Acked | Delivery::Rejected { .. })
    }
}

/// Passed to the completion hook once per terminal outcome per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushEvent {
    pub key: String,
    pub namespace: String,
    pub delivery: Delivery,
}

impl FlushEvent {
    pub fn failed(&self) -> bool {
        self.delivery.failed()
    }
}

/// Completion hook.
pub type FlushHook = Arc<dyn Fn(&FlushEvent) + Send + Sync>;

/// Why a drain stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The queue is empty.
    Empty,
    /// The head could not be delivered; it will be retried on the next kick.
    Stalled,
    /// Reading or updating the queue failed.
    Storage(String),
}

/// Summary of one drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub acked: usize,
    pub rejected: usize,
    pub stop: StopReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Draining,
}

struct Inner<T> {
    queue: WriteQueue,
    transport: tokio::sync::Mutex<T>,
    draining: AtomicBool,
    hook: RwLock<Option<FlushHook>>,
}

/// Single logical drain loop over a [`WriteQueue`].
pub struct FlushWorker<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for FlushWorker<T> {
    fn clone(&self) -> Self {
        FlushWorker {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> FlushWorker<T> {
    pub fn new(queue: WriteQueue, transport: T) -> Self {
        FlushWorker {
            inner: Arc::new(Inner {
                queue,
                transport: tokio::sync::Mutex::new(transport),
                draining: AtomicBool::new(false),
                hook: RwLock::new(None),
            }),
        }
    }

    pub fn state(&self) -> WorkerState {
        if self.inner.draining.load(Ordering::Acquire) {
            WorkerState::Draining
        } else {
            WorkerState::Idle
        }
    }

    /// Replace the completion hook.
    pub fn set_hook(&self, hook: FlushHook) {
        match self.inner.hook.write() {
            Ok(mut slot) => *slot = Some(hook),
            Err(poisoned) => *poisoned.into_inner() = Some(hook),
        }
    }

    /// Drain in the caller's task.
    ///
    /// Returns `None` without touching the queue if a drain is already
    /// running.
    pub async fn drain(&self) -> Option<DrainReport> {
        if !self.claim() {
            return None;
        }
        Some(self.run_claimed().await)
    }

    /// Close the transport's connection, waiting for any running drain.
    pub async fn disconnect(&self) -> TransportResult<()> {
        self.inner.transport.lock().await.disconnect().await
    }

    fn claim(&self) -> bool {
        self.inner
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.inner.draining.store(false, Ordering::Release);
    }

    async fn run_claimed(&self) -> DrainReport {
        let mut report = DrainReport {
            acked: 0,
            rejected: 0,
            stop: StopReason::Empty,
        };

        loop {
            report.stop = self.drain_pass(&mut report).await;
            self.release();

            // A write enqueued after the last peek but before the release
            // saw us draining and did not kick; pick it up here.
            if report.stop == StopReason::Empty
                && matches!(self.inner.queue.is_empty(), Ok(false))
                && self.claim()
            {
                continue;
            }
            break;
        }

        info!(
            acked = report.acked,
            rejected = report.rejected,
            stop = ?report.stop,
            "drain finished"
        );
        report
    }

    async fn drain_pass(&self, report: &mut DrainReport) -> StopReason {
        let mut transport = self.inner.transport.lock().await;

        loop {
            let entry = match self.inner.queue.peek_front() {
                Ok(Some(entry)) => entry,
                Ok(None) => return StopReason::Empty,
                Err(e) => {
                    error!("failed to read write queue: {}", e);
                    return StopReason::Storage(e.to_string());
                }
            };

            let result = transport.set_item(SetItemRequest::from(&entry)).await;
            let delivery = Delivery::classify(&entry.key, result);

            if delivery.is_terminal_for_entry() {
                match self.inner.queue.pop_front_if(&entry) {
                    Ok(true) => {}
                    Ok(false) => debug!(key = %entry.key, "head already removed elsewhere"),
                    Err(e) => {
                        error!(key = %entry.key, "failed to dequeue delivered write: {}", e);
                        self.notify(entry, delivery);
                        return StopReason::Storage(e.to_string());
                    }
                }
            }

            match &delivery {
                Delivery::Acked => {
                    debug!(key = %entry.key, namespace = %entry.namespace, "write delivered");
                    report.acked += 1;
                }
                Delivery::Rejected { code } => {
                    warn!(key = %entry.key, code = %code, "remote rejected write; dropped");
                    report.rejected += 1;
                }
                Delivery::NetworkError(reason) => {
                    warn!(key = %entry.key, "delivery failed, will retry: {}", reason);
                }
                Delivery::ResponseMismatch { expected, received } => {
                    warn!(%expected, %received, "response key mismatch, will retry");
                }
            }

            let stalled = !delivery.is_terminal_for_entry();
            self.notify(entry, delivery);
            if stalled {
                return StopReason::Stalled;
            }
        }
    }

    fn notify(&self, entry: QueueEntry, delivery: Delivery) {
        let hook = match self.inner.hook.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(hook) = hook {
            hook(&FlushEvent {
                key: entry.key,
                namespace: entry.namespace,
                delivery,
            });
        }
    }
}

impl<T: Transport + 'static> FlushWorker<T> {
    /// Start a drain on the current tokio runtime.
    ///
    /// Returns false if a drain is already running or there is no runtime
    /// to run one on; queued writes wait for the next kick.
    pub fn kick(&self) -> bool {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime; flush deferred");
            return false;
        };
        if !self.claim() {
            return false;
        }
        let worker = self.clone();
        handle.spawn(async move {
            worker.run_claimed().await;
        });
        true
    }
}
