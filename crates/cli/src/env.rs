// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Returns the value of `FIELDSYNC_DATA_DIR` if set.
pub fn data_dir() -> Option<PathBuf> {
    non_empty(vars::FIELDSYNC_DATA_DIR).map(PathBuf::from)
}

/// Returns the value of `FIELDSYNC_AUTH_TOKEN` if set.
pub fn auth_token() -> Option<String> {
    non_empty(vars::FIELDSYNC_AUTH_TOKEN)
}

/// Returns the value of `FIELDSYNC_BASE_URL` if set.
pub fn base_url() -> Option<String> {
    non_empty(vars::FIELDSYNC_BASE_URL)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
