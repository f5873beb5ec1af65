// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{ApiError, ProcessError, RepositoryError};

/// Errors surfaced by the fieldsync command line.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("no data directory available\n  hint: pass --data-dir or set FIELDSYNC_DATA_DIR")]
    NoDataDir,

    #[error("{0}")]
    Core(#[from] fieldsync_core::Error),

    #[error("{0}")]
    Process(#[from] ProcessError),

    #[error("{0}")]
    Repository(#[from] RepositoryError),

    #[error("request failed: {0}")]
    Api(#[from] ApiError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for fieldsync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
