// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::{ItemType, NewSyncItem, SyncItem};

use super::{print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::QueueProcessor;

pub fn run(
    ctx: &Context,
    item_type: ItemType,
    session_id: String,
    item_id: String,
    priority: Option<i64>,
    max_retries: Option<u32>,
    output: OutputFormat,
) -> Result<()> {
    let processor = ctx.manual_processor()?;
    let item = enqueue(&processor, item_type, session_id, item_id, priority, max_retries)?;
    match output {
        OutputFormat::Text => {
            println!("Enqueued {} ({} {})", item.id, item.item_type, item.item_id)
        }
        OutputFormat::Json => print_json(&item)?,
    }
    Ok(())
}

pub(crate) fn enqueue(
    processor: &QueueProcessor,
    item_type: ItemType,
    session_id: String,
    item_id: String,
    priority: Option<i64>,
    max_retries: Option<u32>,
) -> Result<SyncItem> {
    let mut new = NewSyncItem::new(session_id, item_type, item_id);
    if let Some(priority) = priority {
        new = new.with_priority(priority);
    }
    if let Some(max_retries) = max_retries {
        new = new.with_max_retries(max_retries);
    }
    Ok(processor.enqueue(new)?)
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
