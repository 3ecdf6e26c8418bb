// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted schema version and upgrades of older layouts.
//!
//! The schema version lives in its own metadata slot, independent of the
//! queue. [`migrate`] runs every pending upgrade step and the version bump in
//! a single storage transaction, and every step is a no-op on data that is
//! already upgraded, so a retry after a crash converges to the same state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::entry::QueueEntry;
use crate::error::{Error, Result};
use crate::namespace::{load_or_create_id, local_key, INSTALLATION_ID_SLOT};
use crate::queue::push_in;
use crate::storage::{read_json, write_json, KvStore, KvTxn};

/// Slot holding [`Metadata`].
pub const METADATA_SLOT: &str = ".objsync.metadata";

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Version 0 kept the installation id here.
pub const LEGACY_INSTALLATION_ID_SLOT: &str = "deviceid";

/// Version 0 kept pending writes here.
pub const LEGACY_QUEUE_SLOT: &str = "adrenalineServerQueue";

/// Persisted bookkeeping, tracked separately from the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub schema_version: u32,
}

/// A pending write as stored by version 0.
#[derive(Debug, Deserialize)]
struct LegacyEntry {
    key: String,
    #[serde(default)]
    value: Value,
    #[serde(default, alias = "uuid")]
    namespace: Option<String>,
}

/// What a call to [`migrate`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found in storage (0 when absent).
    pub from: u32,
    /// Version in storage afterwards.
    pub to: u32,
    /// Legacy pending writes moved into the current queue.
    pub requeued: usize,
}

impl MigrationReport {
    pub fn upgraded(&self) -> bool {
        self.from != self.to
    }
}

/// Read the persisted metadata. Absent metadata is version 0.
pub fn read_metadata(store: &dyn KvStore) -> Result<Metadata> {
    let mut metadata = Metadata::default();
    store.transaction(&mut |txn: &mut dyn KvTxn| {
        metadata = read_json(txn, METADATA_SLOT)?.unwrap_or_default();
        Ok(())
    })?;
    Ok(metadata)
}

/// Bring persisted state up to [`CURRENT_SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns [`Error::SchemaTooNew`] if storage was written by a newer build;
/// nothing is modified in that case.
pub fn migrate(store: &dyn KvStore) -> Result<MigrationReport> {
    let mut report = MigrationReport {
        from: 0,
        to: CURRENT_SCHEMA_VERSION,
        requeued: 0,
    };

    store.transaction(&mut |txn: &mut dyn KvTxn| {
        let metadata: Metadata = read_json(txn, METADATA_SLOT)?.unwrap_or_default();
        report.from = metadata.schema_version;
        report.requeued = 0;

        if metadata.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(Error::SchemaTooNew {
                found: metadata.schema_version,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }
        if metadata.schema_version == CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        if metadata.schema_version < 1 {
            relocate_installation_id(txn)?;
            report.requeued = requeue_legacy_writes(txn)?;
        }

        write_json(
            txn,
            METADATA_SLOT,
            &Metadata {
                schema_version: CURRENT_SCHEMA_VERSION,
            },
        )
    })?;

    if report.upgraded() {
        info!(
            from = report.from,
            to = report.to,
            requeued = report.requeued,
            "migrated sync storage"
        );
    }
    Ok(report)
}

/// Move the version 0 installation id into its current slot.
///
/// An id already in the current slot wins; the legacy slot is dropped either way.
fn relocate_installation_id(txn: &mut dyn KvTxn) -> Result<()> {
    let Some(legacy) = txn.get(LEGACY_INSTALLATION_ID_SLOT)? else {
        return Ok(());
    };
    if txn.get(INSTALLATION_ID_SLOT)?.is_none() {
        txn.put(INSTALLATION_ID_SLOT, &legacy)?;
    }
    txn.remove(LEGACY_INSTALLATION_ID_SLOT)
}

/// Move version 0 pending writes to the back of the current queue.
///
/// Each write is also applied to its local value slot, as a fresh write would be.
fn requeue_legacy_writes(txn: &mut dyn KvTxn) -> Result<usize> {
    let Some(legacy) = read_json::<Vec<LegacyEntry>>(txn, LEGACY_QUEUE_SLOT)? else {
        return Ok(0);
    };

    let mut installation_id: Option<String> = None;
    let count = legacy.len();
    for item in legacy {
        let namespace = match item.namespace {
            Some(namespace) => namespace,
            None => match &installation_id {
                Some(id) => id.clone(),
                None => {
                    let id = load_or_create_id(txn)?;
                    installation_id = Some(id.clone());
                    id
                }
            },
        };
        write_json(txn, &local_key(&item.key, &namespace), &item.value)?;
        push_in(txn, QueueEntry::new(item.key, item.value, namespace))?;
    }

    txn.remove(LEGACY_QUEUE_SLOT)?;
    Ok(count)
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
