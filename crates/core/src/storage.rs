// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key/value surface the sync state is persisted in.
//!
//! Every read-modify-write of sync state goes through [`KvStore::transaction`],
//! which commits all of its writes or none of them. Two backends exist:
//!
//! - [`SqliteStore`]: a single-table SQLite file. Transactions are
//!   `BEGIN IMMEDIATE`, so writers are serialized across threads and across
//!   processes that share the file.
//! - [`MemoryStore`]: an in-process map with an optional byte quota, used by
//!   tests and by hosts that do not need durability.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// SQL schema for the slot table.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    slot TEXT PRIMARY KEY,
    value BLOB NOT NULL
);
"#;

/// How long a writer waits for another process to release the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A view of the store inside one transaction.
pub trait KvTxn {
    /// Read a slot, seeing this transaction's own uncommitted writes.
    fn get(&self, slot: &str) -> Result<Option<Vec<u8>>>;

    /// Write a slot.
    fn put(&mut self, slot: &str, bytes: &[u8]) -> Result<()>;

    /// Delete a slot. Deleting an absent slot is not an error.
    fn remove(&mut self, slot: &str) -> Result<()>;
}

/// Process-wide persistent key/value storage.
pub trait KvStore: Send + Sync {
    /// Run `f` atomically. If `f` returns an error nothing it wrote is kept.
    fn transaction(&self, f: &mut dyn FnMut(&mut dyn KvTxn) -> Result<()>) -> Result<()>;

    /// Read a single slot.
    fn read(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        let mut value = None;
        self.transaction(&mut |txn: &mut dyn KvTxn| {
            value = txn.get(slot)?;
            Ok(())
        })?;
        Ok(value)
    }

    /// Write a single slot.
    fn write(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        self.transaction(&mut |txn: &mut dyn KvTxn| txn.put(slot, bytes))
    }

    /// Delete a single slot.
    fn delete(&self, slot: &str) -> Result<()> {
        self.transaction(&mut |txn: &mut dyn KvTxn| txn.remove(slot))
    }
}

/// Read and decode a JSON value from a slot.
pub fn read_json<T: DeserializeOwned>(txn: &dyn KvTxn, slot: &str) -> Result<Option<T>> {
    match txn.get(slot)? {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            Error::CorruptedData(format!("slot '{slot}' does not hold valid JSON: {e}"))
        }),
    }
}

/// Encode a value as JSON and write it to a slot.
pub fn write_json<T: Serialize + ?Sized>(txn: &mut dyn KvTxn, slot: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    txn.put(slot, &bytes)
}

/// SQLite-backed store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a private in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }
}

struct SqliteTxn<'a, 'c> {
    tx: &'a rusqlite::Transaction<'c>,
}

impl KvTxn for SqliteTxn<'_, '_> {
    fn get(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .tx
            .query_row(
                "SELECT value FROM slots WHERE slot = ?1",
                params![slot],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, slot: &str, bytes: &[u8]) -> Result<()> {
        self.tx.execute(
            "INSERT INTO slots (slot, value) VALUES (?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET value = excluded.value",
            params![slot, bytes],
        )?;
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<()> {
        self.tx
            .execute("DELETE FROM slots WHERE slot = ?1", params![slot])?;
        Ok(())
    }
}

impl KvStore for SqliteStore {
    fn transaction(&self, f: &mut dyn FnMut(&mut dyn KvTxn) -> Result<()>) -> Result<()> {
        let mut conn = self.conn.lock().map_err(|_| Error::LockPoisoned)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut txn = SqliteTxn { tx: &tx };
            // Dropping `tx` on error rolls back.
            f(&mut txn)?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// In-memory store with an optional byte quota.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Vec<u8>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding at most `bytes` of slot names plus values.
    pub fn with_quota(bytes: usize) -> Self {
        MemoryStore {
            slots: Mutex::new(HashMap::new()),
            quota: Some(bytes),
        }
    }

    /// Total bytes currently used (slot names plus values).
    pub fn used_bytes(&self) -> Result<usize> {
        let slots = self.slots.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(usage(&slots))
    }
}

fn usage(slots: &HashMap<String, Vec<u8>>) -> usize {
    slots.iter().map(|(k, v)| k.len() + v.len()).sum()
}

struct MemoryTxn<'a> {
    base: &'a HashMap<String, Vec<u8>>,
    staged: HashMap<String, Option<Vec<u8>>>,
}

impl KvTxn for MemoryTxn<'_> {
    fn get(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        match self.staged.get(slot) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.base.get(slot).cloned()),
        }
    }

    fn put(&mut self, slot: &str, bytes: &[u8]) -> Result<()> {
        self.staged.insert(slot.to_string(), Some(bytes.to_vec()));
        Ok(())
    }

    fn remove(&mut self, slot: &str) -> Result<()> {
        self.staged.insert(slot.to_string(), None);
        Ok(())
    }
}

impl KvStore for MemoryStore {
    fn transaction(&self, f: &mut dyn FnMut(&mut dyn KvTxn) -> Result<()>) -> Result<()> {
        let mut slots = self.slots.lock().map_err(|_| Error::LockPoisoned)?;

        let staged = {
            let mut txn = MemoryTxn {
                base: &*slots,
                staged: HashMap::new(),
            };
            f(&mut txn)?;
            txn.staged
        };

        if let Some(quota) = self.quota {
            let mut after = usage(&slots);
            for (slot, value) in &staged {
                if let Some(old) = slots.get(slot) {
                    after -= slot.len() + old.len();
                }
                if let Some(new) = value {
                    after += slot.len() + new.len();
                }
            }
            if after > quota {
                return Err(Error::StorageFull);
            }
        }

        for (slot, value) in staged {
            match value {
                Some(bytes) => {
                    slots.insert(slot, bytes);
                }
                None => {
                    slots.remove(&slot);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
