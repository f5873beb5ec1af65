// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::{ItemStatus, ItemType, SyncItem, SyncItemStore};

use super::{format_time, print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

pub fn run(
    ctx: &Context,
    status: Option<ItemStatus>,
    item_type: Option<ItemType>,
    limit: Option<usize>,
    output: OutputFormat,
) -> Result<()> {
    let store = ctx.open_store()?;
    let items = select(&store, status, item_type, limit)?;
    match output {
        OutputFormat::Text => print!("{}", render_text(&items)),
        OutputFormat::Json => print_json(&items)?,
    }
    Ok(())
}

/// Items in dispatch order, filtered and truncated.
pub(crate) fn select(
    store: &SyncItemStore,
    status: Option<ItemStatus>,
    item_type: Option<ItemType>,
    limit: Option<usize>,
) -> Result<Vec<SyncItem>> {
    let items = match status {
        Some(status) => store.find_by_status(status)?,
        None => store.find_all()?,
    };
    Ok(items
        .into_iter()
        .filter(|i| item_type.is_none() || item_type == Some(i.item_type))
        .take(limit.unwrap_or(usize::MAX))
        .collect())
}

fn describe(item: &SyncItem) -> String {
    let ids = item.record_ids();
    if ids.len() > 1 {
        format!("{} records", ids.len())
    } else {
        item.item_id.clone()
    }
}

pub(crate) fn render_text(items: &[SyncItem]) -> String {
    if items.is_empty() {
        return "No sync items\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        out.push_str(&format!(
            "- [{}] {} {} ({}) p{} {}/{}",
            item.status,
            item.id,
            item.item_type,
            describe(item),
            item.priority,
            item.retry_count,
            item.max_retries
        ));
        if let (ItemStatus::Pending, Some(at)) = (item.status, item.next_retry_at) {
            out.push_str(&format!(" retry at {}", format_time(at)));
        }
        out.push('\n');
        if let Some(error) = &item.error_message {
            out.push_str(&format!("    {}\n", error));
        }
    }
    out
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
