// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod delivery;
pub mod items;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use objsync_core::{KvStore, SqliteStore};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::sync::{ObjStore, SyncConfig};

/// Open the local store for one command.
///
/// A command process exits as soon as it is done, so delivery only
/// happens when the command awaits it; background flushes stay off.
pub fn open_store(config: &Config, db_path: &Path) -> Result<ObjStore> {
    if let Some(dir) = db_path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    debug!("opening {}", db_path.display());
    let store: Arc<dyn KvStore> = Arc::new(SqliteStore::open(db_path)?);

    let sync_config = SyncConfig {
        flush_on_write: false,
        flush_on_open: false,
        ..config.sync_config()
    };
    Ok(ObjStore::open(&sync_config, store)?)
}
