// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use fieldsync_core::{ItemType, SyncFilter};
use serde::Serialize;

use super::{print_json, Context, Engine};
use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::{probe_once, NetworkState, ProcessSummary, SyncOptionsUpdate, SyncOutcome};

/// Result of a one-shot `fieldsync sync`.
#[derive(Debug, Serialize)]
pub struct SyncRunJson {
    pub network: NetworkState,
    pub pass: SyncOutcome,
    pub uploaded: usize,
    pub rescheduled: usize,
    pub failed: usize,
}

pub async fn run(
    ctx: &Context,
    only: Vec<ItemType>,
    no_audio: bool,
    output: OutputFormat,
) -> Result<()> {
    let engine = Engine::build(ctx, false)?;
    if let Some(filter) = filter_override(only, no_audio) {
        engine.coordinator.update_options(SyncOptionsUpdate {
            filter: Some(filter),
            ..SyncOptionsUpdate::default()
        });
    }
    let result = sync_once(ctx, &engine).await?;
    match output {
        OutputFormat::Text => print!("{}", render_text(&result)),
        OutputFormat::Json => print_json(&result)?,
    }
    Ok(())
}

/// Filter built from the command-line flags, if any were given.
pub(crate) fn filter_override(only: Vec<ItemType>, no_audio: bool) -> Option<SyncFilter> {
    if only.is_empty() && !no_audio {
        return None;
    }
    Some(SyncFilter {
        item_types: only,
        exclude_audio: no_audio,
        ..SyncFilter::default()
    })
}

/// Probes connectivity, runs one pass, then drains whatever is ready.
pub async fn sync_once(ctx: &Context, engine: &Engine) -> Result<SyncRunJson> {
    let network = &ctx.config.network;
    let state = probe_once(
        engine.client.as_ref(),
        &ctx.config.server.health_path,
        network.connection_type,
    )
    .await;
    engine.network.set(state);

    let pass = engine.coordinator.sync().await;
    let summary = if state.is_connected {
        engine.processor.process().await?
    } else {
        ProcessSummary::default()
    };
    Ok(SyncRunJson {
        network: state,
        pass,
        uploaded: summary.completed,
        rescheduled: summary.rescheduled,
        failed: summary.failed,
    })
}

pub(crate) fn render_text(result: &SyncRunJson) -> String {
    let mut out = String::new();
    match &result.pass {
        SyncOutcome::Skipped { reason } => {
            out.push_str(&format!("Sync skipped: {}\n", reason));
        }
        SyncOutcome::Completed(report) => {
            out.push_str(&format!(
                "Enqueued {} sessions, {} sensor batches, {} audio files\n",
                report.sessions, report.sensor_batches, report.audio_files
            ));
            if report.rejected > 0 {
                out.push_str(&format!(
                    "  skipped {} records with ids unusable in a batch\n",
                    report.rejected
                ));
            }
            for error in &report.errors {
                out.push_str(&format!("  warning: {}\n", error));
            }
        }
    }
    if result.uploaded + result.rescheduled + result.failed > 0 {
        out.push_str(&format!(
            "Uploaded {}, rescheduled {}, failed {}\n",
            result.uploaded, result.rescheduled, result.failed
        ));
    }
    out
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
