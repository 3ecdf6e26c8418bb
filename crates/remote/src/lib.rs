// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! objsync-remote: reference remote store for objsync clients.
//!
//! Keeps the last accepted value per `(namespace, key)` and answers every
//! `set_item` with a `set_item_result`. Accepted writes are appended to a
//! JSONL log in the data directory and replayed at startup.

pub mod server;
pub mod state;

#[cfg(test)]
mod server_tests;

pub use state::ServerState;
