// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted write queue with write combining.
//!
//! The whole queue is stored as one JSON array in a single slot and every
//! operation re-reads it, mutates it, and writes it back inside one storage
//! transaction. Nothing is cached between calls, so independent handles over
//! the same storage always see the same queue.
//!
//! Combining: when a write targets the same `(key, namespace)` as the last
//! entry, and that entry is not the head, its value is replaced in place.
//! The head may already be on the wire, so it is never rewritten.

use std::sync::Arc;

use tracing::debug;

use crate::entry::QueueEntry;
use crate::error::Result;
use crate::storage::{read_json, write_json, KvStore, KvTxn};

/// Slot holding the serialized queue.
pub const QUEUE_SLOT: &str = ".objsync.queue";

/// Minimum queue length before the tail may absorb a write.
const COMBINE_MIN_LEN: usize = 2;

/// What [`WriteQueue::enqueue`] did with a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// A new entry was appended.
    Appended,
    /// The last entry's value was replaced.
    Combined,
}

/// Append `entry` to `queue`, or fold it into the tail if allowed.
pub fn combine_or_push(queue: &mut Vec<QueueEntry>, entry: QueueEntry) -> Enqueued {
    if queue.len() >= COMBINE_MIN_LEN {
        if let Some(last) = queue.last_mut() {
            if last.same_target(&entry) {
                last.value = entry.value;
                return Enqueued::Combined;
            }
        }
    }
    queue.push(entry);
    Enqueued::Appended
}

/// Load the queue inside a transaction. An absent slot is an empty queue.
pub fn load(txn: &dyn KvTxn) -> Result<Vec<QueueEntry>> {
    Ok(read_json(txn, QUEUE_SLOT)?.unwrap_or_default())
}

/// Replace the queue inside a transaction.
pub fn save(txn: &mut dyn KvTxn, queue: &[QueueEntry]) -> Result<()> {
    write_json(txn, QUEUE_SLOT, queue)
}

/// Enqueue inside an existing transaction.
pub fn push_in(txn: &mut dyn KvTxn, entry: QueueEntry) -> Result<Enqueued> {
    let mut queue = load(txn)?;
    let key = entry.key.clone();
    let outcome = combine_or_push(&mut queue, entry);
    save(txn, &queue)?;
    debug!(key = %key, len = queue.len(), ?outcome, "enqueued write");
    Ok(outcome)
}

/// Handle on the persisted queue.
#[derive(Clone)]
pub struct WriteQueue {
    store: Arc<dyn KvStore>,
}

impl WriteQueue {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        WriteQueue { store }
    }

    /// Append a write, combining with the tail where allowed.
    pub fn enqueue(&self, entry: QueueEntry) -> Result<Enqueued> {
        let mut entry = Some(entry);
        let mut outcome = Enqueued::Appended;
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            if let Some(entry) = entry.take() {
                outcome = push_in(txn, entry)?;
            }
            Ok(())
        })?;
        Ok(outcome)
    }

    /// The head of the queue, without removing it.
    pub fn peek_front(&self) -> Result<Option<QueueEntry>> {
        let mut head = None;
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            head = load(txn)?.into_iter().next();
            Ok(())
        })?;
        Ok(head)
    }

    /// Remove and return the head. `None` if the queue was empty.
    pub fn pop_front(&self) -> Result<Option<QueueEntry>> {
        let mut popped = None;
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            let mut queue = load(txn)?;
            if queue.is_empty() {
                return Ok(());
            }
            popped = Some(queue.remove(0));
            save(txn, &queue)
        })?;
        Ok(popped)
    }

    /// Remove the head only if it still equals `expected`.
    ///
    /// Returns false if another handle already removed it.
    pub fn pop_front_if(&self, expected: &QueueEntry) -> Result<bool> {
        let mut popped = false;
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            let mut queue = load(txn)?;
            if queue.first() != Some(expected) {
                return Ok(());
            }
            queue.remove(0);
            popped = true;
            save(txn, &queue)
        })?;
        Ok(popped)
    }

    /// Snapshot of every pending entry, head first.
    pub fn entries(&self) -> Result<Vec<QueueEntry>> {
        let mut entries = Vec::new();
        self.store.transaction(&mut |txn: &mut dyn KvTxn| {
            entries = load(txn)?;
            Ok(())
        })?;
        Ok(entries)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
