// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSON Lines reading for record imports.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Reads every record from a JSONL file.
///
/// Blank lines are skipped. A malformed line fails the whole read with
/// [`Error::CorruptedData`] naming the 1-based line number.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| Error::CorruptedData(format!("line {}: {e}", index + 1)))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
