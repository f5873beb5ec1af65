// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset. One-shot commands only surface
/// warnings on stderr; the long-running engine logs progress.
pub fn default_directive(verbose: bool, long_running: bool) -> &'static str {
    match (verbose, long_running) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    }
}

/// Installs the global subscriber.
///
/// With `log_file`, output is appended to that file without ANSI colors,
/// falling back to stderr if the file cannot be opened. A subscriber that is
/// already installed is left in place.
pub fn setup_logging(verbose: bool, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, log_file.is_some())));

    let file = log_file.and_then(|path| {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let installed = match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        quiet_command = { false, false, "warn" },
        engine = { false, true, "info" },
        verbose_command = { true, false, "debug" },
        verbose_engine = { true, true, "debug" },
    )]
    fn directive(verbose: bool, long_running: bool, expected: &str) {
        assert_eq!(default_directive(verbose, long_running), expected);
    }
}
