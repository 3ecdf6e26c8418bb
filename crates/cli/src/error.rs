// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::SyncError;

/// All possible errors that can occur in the objsync command-line host.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("flush stalled with {remaining} write(s) pending\n  hint: check that the remote url is reachable, then run 'objsync flush' again")]
    FlushStalled { remaining: usize },

    #[error("flush stopped: {0}")]
    FlushFailed(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] objsync_core::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for objsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
