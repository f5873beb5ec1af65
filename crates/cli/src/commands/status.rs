// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::{PassStatistics, PendingCounts, QueueStats};
use serde::Serialize;

use super::{format_time, print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct StatusJson {
    pub pending_sessions: usize,
    pub pending_sensor_data: usize,
    pub pending_audio_files: usize,
    pub queue: QueueStats,
    /// Epoch milliseconds of the earliest scheduled retry.
    pub next_retry_at: Option<i64>,
    pub passes: PassStatistics,
}

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let local = ctx.open_local()?;
    let store = ctx.open_store()?;
    let status = collect(
        &local.pending_counts()?,
        store.get_statistics()?,
        store.next_retry_due()?,
        store.pass_statistics()?,
    );
    match output {
        OutputFormat::Text => print!("{}", render_text(&status)),
        OutputFormat::Json => print_json(&status)?,
    }
    Ok(())
}

pub(crate) fn collect(
    pending: &PendingCounts,
    queue: QueueStats,
    next_retry_at: Option<i64>,
    passes: PassStatistics,
) -> StatusJson {
    StatusJson {
        pending_sessions: pending.sessions,
        pending_sensor_data: pending.sensor_data,
        pending_audio_files: pending.audio_files,
        queue,
        next_retry_at,
        passes,
    }
}

pub(crate) fn render_text(status: &StatusJson) -> String {
    let q = &status.queue;
    let mut out = format!(
        "Not uploaded: {} sessions, {} sensor samples, {} audio files\n\
         Queue: {} total, {} pending, {} in progress, {} completed, {} failed\n",
        status.pending_sessions,
        status.pending_sensor_data,
        status.pending_audio_files,
        q.total,
        q.pending,
        q.in_progress,
        q.completed,
        q.failed,
    );
    if q.expired > 0 {
        out.push_str(&format!(
            "  {} failed items exhausted their retries (fieldsync retry-failed)\n",
            q.expired
        ));
    }
    if let Some(at) = status.next_retry_at {
        out.push_str(&format!("Next retry: {}\n", format_time(at)));
    }
    let p = &status.passes;
    if p.total > 0 {
        out.push_str(&format!(
            "Sync passes: {} ({} ok, {} with errors), average {}ms\n",
            p.total, p.successful, p.failed, p.average_duration_ms
        ));
        match p.last_success_at {
            Some(at) => out.push_str(&format!("Last successful sync: {}\n", format_time(at))),
            None => out.push_str("Last successful sync: never\n"),
        }
    }
    out
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
