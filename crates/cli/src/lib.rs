// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! objsync - a local key/value store whose writes are delivered to a
//! remote store through a durable, write-combining queue.
//!
//! # Main Components
//!
//! - [`ObjStore`] - local reads and writes plus the pending-write queue
//! - [`sync`] - the flush worker and the WebSocket transport it drives
//! - [`Config`] - host configuration (`config.toml`)
//! - [`Error`] - error types for the command line
//!
//! ```rust,ignore
//! use objsync::{ObjStore, SyncConfig};
//! use objsync_core::SqliteStore;
//!
//! let store = ObjStore::open(&SyncConfig::default(), Arc::new(SqliteStore::open(path)?))?;
//! store.set_item("color", json!("blue"), None)?;
//! store.flush().await;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{Error, Result};
pub use sync::{ObjStore, SyncConfig};

use tracing::{debug, warn};

/// Execute a CLI invocation against the configured local store.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let config = Config::load(&config_path)?;
    let db_path = cli.db.unwrap_or_else(|| config.database_path());
    debug!("config {}, store {}", config_path.display(), db_path.display());

    let store = commands::open_store(&config, &db_path)?;
    let result = match cli.command {
        Command::Set {
            key,
            value,
            namespace,
            flush,
        } => {
            let flush = flush || config.remote.flush_on_write;
            commands::items::set(&store, &key, &value, namespace.as_deref(), flush).await
        }
        Command::Get { key, namespace } => {
            commands::items::get(&store, &key, namespace.as_deref())
        }
        Command::Remove { key, namespace } => {
            commands::items::remove(&store, &key, namespace.as_deref())
        }
        Command::Pending { list } => commands::delivery::pending(&store, list),
        Command::Flush => commands::delivery::flush(&store).await,
        Command::Id => commands::items::id(&store),
    };

    if let Err(e) = store.disconnect().await {
        warn!("closing remote connection: {}", e);
    }
    result
}
