// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote sync for locally stored objects.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  ObjStore   │────►│ FlushWorker │────►│  Transport  │────►│   Remote    │
//! │  (facade)   │     │  (drain)    │◄────│   (trait)   │◄────│   Store     │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────────────────────┐
//! │  WriteQueue (persisted)     │
//! └─────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - Local writes commit together with their queue entry
//! - One drain loop per process, started by kicks or awaited in place
//! - Head-of-queue blocking on network errors, drop on remote rejection
//! - Injectable transport trait for testing

mod store;
mod transport;
mod worker;

pub use store::{ObjStore, SyncConfig, SyncError, SyncResult};
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};
pub use worker::{
    Delivery, DrainReport, FlushEvent, FlushHook, FlushWorker, StopReason, WorkerState,
};

#[cfg(test)]
mod test_helpers;
