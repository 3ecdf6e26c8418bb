// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue commands: pending, flush.

use crate::error::{Error, Result};
use crate::sync::{Delivery, FlushEvent, ObjStore, StopReason, Transport};

pub fn pending<T: Transport + 'static>(store: &ObjStore<T>, list: bool) -> Result<()> {
    if !list {
        println!("{}", store.pending_write_count()?);
        return Ok(());
    }
    for entry in store.pending_writes()? {
        println!("{}\t{}\t{}", entry.namespace, entry.key, entry.value);
    }
    Ok(())
}

/// One line per delivery outcome.
pub fn describe(event: &FlushEvent) -> String {
    match &event.delivery {
        Delivery::Acked => format!("sent {}", event.key),
        Delivery::Rejected { code } => format!("rejected {} ({})", event.key, code),
        Delivery::NetworkError(reason) => format!("failed {}: {}", event.key, reason),
        Delivery::ResponseMismatch { received, .. } => {
            format!("failed {}: response was for {}", event.key, received)
        }
    }
}

/// Drain the queue, printing each outcome.
///
/// Fails with [`Error::FlushStalled`] if a write could not be delivered.
pub async fn flush<T: Transport + 'static>(store: &ObjStore<T>) -> Result<()> {
    store.on_mutation_flushed(|event| println!("{}", describe(event)));

    let Some(report) = store.flush().await else {
        return Ok(());
    };
    match report.stop {
        StopReason::Empty => {
            println!(
                "flushed {} write(s), {} rejected",
                report.acked, report.rejected
            );
            Ok(())
        }
        StopReason::Stalled => Err(Error::FlushStalled {
            remaining: store.pending_write_count()?,
        }),
        StopReason::Storage(reason) => Err(Error::FlushFailed(reason)),
    }
}

#[cfg(test)]
#[path = "delivery_tests.rs"]
mod tests;
