// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs and value parsers for CLI commands.

use clap::{Args, ValueEnum};
use fieldsync_core::{ItemStatus, ItemType};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output format selection.
#[derive(Args, Clone, Copy, Debug, Default)]
pub struct OutputArgs {
    /// Output format (text, json)
    #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
    pub output: OutputFormat,
}

pub(crate) fn parse_item_type(s: &str) -> Result<ItemType, String> {
    s.parse().map_err(|e: fieldsync_core::Error| e.to_string())
}

pub(crate) fn parse_status(s: &str) -> Result<ItemStatus, String> {
    s.parse().map_err(|e: fieldsync_core::Error| e.to_string())
}

/// Parse a string that must not be empty or whitespace-only.
pub(crate) fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}
