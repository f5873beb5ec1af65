// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync pass history.

use fieldsync_core::{PassStatistics, SyncPass};
use serde::Serialize;

use super::{format_time, print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Serialize)]
pub struct HistoryJson {
    pub statistics: PassStatistics,
    /// Newest first.
    pub passes: Vec<SyncPass>,
}

pub fn run(ctx: &Context, limit: Option<usize>, clear: bool, output: OutputFormat) -> Result<()> {
    let store = ctx.open_store()?;
    if clear {
        let removed = store.clear_passes()?;
        tracing::info!("cleared {} sync passes", removed);
        println!("Cleared {} sync passes", removed);
        return Ok(());
    }
    let history = HistoryJson {
        statistics: store.pass_statistics()?,
        passes: store.recent_passes(limit.unwrap_or(DEFAULT_LIMIT))?,
    };
    match output {
        OutputFormat::Text => print!("{}", render_text(&history)),
        OutputFormat::Json => print_json(&history)?,
    }
    Ok(())
}

pub(crate) fn render_text(history: &HistoryJson) -> String {
    if history.passes.is_empty() {
        return "No sync passes recorded\n".to_string();
    }
    let stats = &history.statistics;
    let mut out = format!(
        "{} passes, {} ok, {} with errors, {} items enqueued, average {}ms\n",
        stats.total,
        stats.successful,
        stats.failed,
        stats.items_enqueued,
        stats.average_duration_ms
    );
    for pass in &history.passes {
        out.push_str(&format!(
            "- {} {} {} enqueued in {}ms\n",
            format_time(pass.started_at),
            if pass.success { "ok" } else { "error" },
            pass.enqueued,
            pass.duration_ms
        ));
        if let Some(error) = &pass.error {
            out.push_str(&format!("    {}\n", error));
        }
    }
    out
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
