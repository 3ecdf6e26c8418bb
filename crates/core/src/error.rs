// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for objsync-core operations.

use thiserror::Error;

/// All possible errors that can occur while touching persisted sync state.
#[derive(Debug, Error)]
pub enum Error {
    #[error("local storage is full\n  hint: remove unused items or raise the storage quota, then retry the write")]
    StorageFull,

    #[error("persisted schema version {found} is newer than supported version {supported}\n  hint: this data was written by a newer objsync; upgrade before opening it")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("storage lock poisoned by a panicked writer")]
    LockPoisoned,
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, _)
                if code.code == rusqlite::ErrorCode::DiskFull =>
            {
                Error::StorageFull
            }
            other => Error::Database(other),
        }
    }
}

/// A specialized Result type for objsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
