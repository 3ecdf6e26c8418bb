// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local item commands: set, get, remove, id.

use objsync_core::Enqueued;
use serde_json::Value;

use super::delivery;
use crate::error::{Error, Result};
use crate::sync::{ObjStore, Transport};

/// Parse a command-line value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("key cannot be empty".to_string()));
    }
    Ok(())
}

pub async fn set<T: Transport + 'static>(
    store: &ObjStore<T>,
    key: &str,
    raw_value: &str,
    namespace: Option<&str>,
    flush: bool,
) -> Result<()> {
    check_key(key)?;

    match store.set_item(key, parse_value(raw_value), namespace)? {
        Enqueued::Appended => println!("queued {}", key),
        Enqueued::Combined => println!("queued {} (combined with pending write)", key),
    }

    if flush {
        delivery::flush(store).await?;
    }
    Ok(())
}

pub fn get<T: Transport + 'static>(
    store: &ObjStore<T>,
    key: &str,
    namespace: Option<&str>,
) -> Result<()> {
    check_key(key)?;
    match store.get_item(key, namespace)? {
        Some(value) => {
            println!("{}", value);
            Ok(())
        }
        None => Err(Error::NotFound(key.to_string())),
    }
}

pub fn remove<T: Transport + 'static>(
    store: &ObjStore<T>,
    key: &str,
    namespace: Option<&str>,
) -> Result<()> {
    check_key(key)?;
    store.remove_item(key, namespace)?;
    Ok(())
}

pub fn id<T: Transport + 'static>(store: &ObjStore<T>) -> Result<()> {
    println!("{}", store.installation_id()?);
    Ok(())
}

#[cfg(test)]
#[path = "items_tests.rs"]
mod tests;
