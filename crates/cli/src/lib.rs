// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync - An offline-first upload queue for field recordings.
//!
//! This crate provides the sync engine behind the `fieldsync` CLI: a durable
//! queue of upload work, per-type upload handlers, and a coordinator that
//! reconciles locally captured records with the server whenever
//! connectivity allows.
//!
//! # Main Components
//!
//! - [`sync`] - Coordinator, queue processor, upload handlers and transport
//! - [`Config`] - `config.toml` in the data directory
//! - [`Error`] - Error types for all operations
//!
//! # Embedding
//!
//! ```rust,ignore
//! use fieldsync::sync::{register_upload_handlers, QueueProcessor, SyncCoordinator};
//!
//! let processor = QueueProcessor::new(store, config.processor_config());
//! register_upload_handlers(&processor, client, &repos, Arc::new(FsProbe));
//! let coordinator = SyncCoordinator::new(processor, repos, network, config.sync_options());
//! coordinator.start().await;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod env;
pub mod error;
pub mod logging;
pub mod sync;

pub use cli::{Cli, Command, OutputArgs, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};

use commands::Context;
use config::log_path;

/// Runs a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(cli.data_dir)?;
    let log_file = matches!(cli.command, Command::Run).then(|| log_path(&ctx.data_dir));
    logging::setup_logging(cli.verbose, log_file.as_deref());

    match cli.command {
        Command::Run => commands::run::run(&ctx).await,
        Command::Sync {
            only,
            no_audio,
            output,
        } => commands::sync::run(&ctx, only, no_audio, output.output).await,
        Command::Status { output } => commands::status::run(&ctx, output.output),
        Command::History {
            limit,
            clear,
            output,
        } => commands::history::run(&ctx, limit, clear, output.output),
        Command::List {
            status,
            item_type,
            limit,
            output,
        } => commands::list::run(&ctx, status, item_type, limit, output.output),
        Command::Enqueue {
            item_type,
            session_id,
            item_id,
            priority,
            max_retries,
            output,
        } => commands::enqueue::run(
            &ctx,
            item_type,
            session_id,
            item_id,
            priority,
            max_retries,
            output.output,
        ),
        Command::RetryFailed => commands::maintenance::retry_failed(&ctx),
        Command::Cleanup { completed, expired } => {
            commands::maintenance::run_cleanup(&ctx, completed, expired)
        }
        Command::Import { file, output } => commands::import::run(&ctx, &file, output.output),
        Command::Config => commands::config::run(&ctx),
    }
}
