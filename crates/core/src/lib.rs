// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! objsync-core: persisted state for the objsync write queue.
//!
//! This crate owns everything that lives in local storage: the key/value
//! surface, the write queue and its combining rule, the installation
//! namespace, schema migrations, and the wire messages exchanged with the
//! remote store. It performs no network I/O.

pub mod entry;
pub mod error;
pub mod jsonl;
pub mod namespace;
pub mod protocol;
pub mod queue;
pub mod schema;
pub mod storage;

pub use entry::QueueEntry;
pub use error::{Error, Result};
pub use namespace::{local_key, Namespacer};
pub use protocol::{ClientMessage, ServerMessage, SetItemRequest, SetItemResponse};
pub use queue::{Enqueued, WriteQueue};
pub use schema::{migrate, MigrationReport, CURRENT_SCHEMA_VERSION};
pub use storage::{KvStore, KvTxn, MemoryStore, SqliteStore};
