// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue upkeep: requeueing failed items and pruning finished ones.

use fieldsync_core::SyncItemStore;

use super::Context;
use crate::error::Result;

pub fn retry_failed(ctx: &Context) -> Result<()> {
    let processor = ctx.manual_processor()?;
    let count = processor.retry_failed()?;
    println!("Requeued {} failed items", count);
    Ok(())
}

/// Rows removed by [`cleanup`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Cleaned {
    pub completed: usize,
    pub expired: usize,
}

pub fn run_cleanup(ctx: &Context, completed: bool, expired: bool) -> Result<()> {
    let store = ctx.open_store()?;
    let cleaned = cleanup(&store, completed, expired)?;
    println!(
        "Deleted {} completed and {} expired items",
        cleaned.completed, cleaned.expired
    );
    Ok(())
}

/// Deletes the selected item classes; selecting neither deletes both.
pub(crate) fn cleanup(store: &SyncItemStore, completed: bool, expired: bool) -> Result<Cleaned> {
    let both = !completed && !expired;
    let mut cleaned = Cleaned::default();
    if completed || both {
        cleaned.completed = store.delete_completed()?;
    }
    if expired || both {
        cleaned.expired = store.delete_expired()?;
    }
    if cleaned.completed + cleaned.expired > 0 {
        tracing::info!(
            "cleanup removed {} completed, {} expired",
            cleaned.completed,
            cleaned.expired
        );
    }
    Ok(cleaned)
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
