// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Host configuration.
//!
//! Configuration is stored in `<config dir>/objsync/config.toml` and includes:
//! - `database`: Optional path of the local store
//! - `[remote]`: Where and when queued writes are delivered

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sync::SyncConfig;

const APP_DIR_NAME: &str = "objsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "objsync.db";

/// Host configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the local store (relative paths resolve against the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// Remote delivery settings.
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Remote delivery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket URL of the remote store (`ws://...` or `wss://...`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Deliver after every write instead of only on `flush`.
    #[serde(default)]
    pub flush_on_write: bool,
    /// Deliver writes left from a previous run as soon as the store opens.
    #[serde(default = "default_flush_on_open")]
    pub flush_on_open: bool,
    /// Per-request timeout in milliseconds (default: 10000). 0 = wait forever.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_url() -> String {
    "ws://localhost:7890".to_string()
}

fn default_flush_on_open() -> bool {
    true
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: default_url(),
            flush_on_write: false,
            flush_on_open: default_flush_on_open(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RemoteConfig {
    /// Validates that the URL is a WebSocket URL.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        let url = &self.url;
        for scheme in ["ws://", "wss://"] {
            if let Some(rest) = url.strip_prefix(scheme) {
                if rest.is_empty() {
                    return Some(format!("remote URL '{}' has no host", url));
                }
                return None;
            }
        }
        Some(format!(
            "invalid remote URL '{}': must start with ws:// or wss://",
            url
        ))
    }

    /// The request timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Config {
    /// Loads configuration from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if let Some(msg) = config.remote.validate_url() {
            return Err(Error::Config(msg));
        }

        if let (Some(database), Some(dir)) = (&config.database, path.parent()) {
            if database.is_relative() {
                config.database = Some(dir.join(database));
            }
        }
        Ok(config)
    }

    /// Writes configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Path of the local store.
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_db_path)
    }

    /// Settings for [`ObjStore`](crate::sync::ObjStore).
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            url: self.remote.url.clone(),
            flush_on_write: self.remote.flush_on_write,
            flush_on_open: self.remote.flush_on_open,
            request_timeout: self.remote.request_timeout(),
        }
    }
}

/// `<config dir>/objsync/config.toml`, or `./config.toml` without a config dir.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// `<data dir>/objsync/objsync.db`, or `./objsync.db` without a data dir.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
