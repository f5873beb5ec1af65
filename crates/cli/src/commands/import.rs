// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use fieldsync_core::{jsonl, LocalDatabase, LocalRecord};
use serde::Serialize;

use super::{print_json, Context};
use crate::cli::OutputFormat;
use crate::error::Result;

/// Counts of imported records by kind.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub sessions: usize,
    pub sensor_data: usize,
    pub audio: usize,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.sessions + self.sensor_data + self.audio
    }
}

pub fn run(ctx: &Context, file: &Path, output: OutputFormat) -> Result<()> {
    let local = ctx.open_local()?;
    let summary = import_file(&local, file)?;
    match output {
        OutputFormat::Text => println!(
            "Imported {} records ({} sessions, {} sensor samples, {} audio files)",
            summary.total(),
            summary.sessions,
            summary.sensor_data,
            summary.audio
        ),
        OutputFormat::Json => print_json(&summary)?,
    }
    Ok(())
}

/// Loads every record in `file` into the local database. The file is parsed
/// in full before anything is written.
pub(crate) fn import_file(local: &LocalDatabase, file: &Path) -> Result<ImportSummary> {
    let records: Vec<LocalRecord> = jsonl::read_all(file)?;
    let mut summary = ImportSummary::default();
    for record in &records {
        match record {
            LocalRecord::Session(_) => summary.sessions += 1,
            LocalRecord::SensorData(_) => summary.sensor_data += 1,
            LocalRecord::Audio(_) => summary.audio += 1,
        }
    }
    local.import(&records)?;
    tracing::info!("imported {} records from {}", records.len(), file.display());
    Ok(summary)
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
