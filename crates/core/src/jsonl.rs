// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL logs.
//!
//! Each record is one JSON line, fsynced before [`append`] returns. A crash
//! mid-append can leave a partial final line; [`replay`] drops it and reports
//! it, while a bad line anywhere else is corruption. Callers that keep
//! appending after a torn tail must [`rewrite`] the log first, or the next
//! record lands on the partial line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Appends a record to a JSONL file with fsync for durability.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(record)?;
    writeln!(file, "{json}")?;
    file.sync_all()?;

    Ok(())
}

/// Records recovered from a log.
#[derive(Debug)]
pub struct Replay<T> {
    pub records: Vec<T>,
    /// True if a partial trailing line was dropped.
    pub torn_tail: bool,
}

/// Reads every record from a JSONL file.
///
/// Skips empty lines and returns nothing if the file doesn't exist.
pub fn replay<T: DeserializeOwned>(path: &Path) -> Result<Replay<T>> {
    let mut replay = Replay {
        records: Vec::new(),
        torn_tail: false,
    };
    if !path.exists() {
        return Ok(replay);
    }

    let reader = BufReader::new(File::open(path)?);
    let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
    let last = lines.iter().rposition(|line| !line.trim().is_empty());

    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => replay.records.push(record),
            Err(e) if Some(idx) == last => {
                warn!("dropping torn final record in {}: {}", path.display(), e);
                replay.torn_tail = true;
            }
            Err(e) => {
                return Err(Error::CorruptedData(format!(
                    "{} line {}: {}",
                    path.display(),
                    idx + 1,
                    e
                )));
            }
        }
    }

    Ok(replay)
}

/// Replaces the log with `records`, fsyncing before returning.
pub fn rewrite<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut file = File::create(path)?;

    for record in records {
        let json = serde_json::to_string(record)?;
        writeln!(file, "{json}")?;
    }
    file.sync_all()?;

    Ok(())
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
