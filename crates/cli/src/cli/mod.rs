// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fieldsync_core::{ItemStatus, ItemType};

use args::{non_empty_string, parse_item_type, parse_status};
pub use args::{OutputArgs, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "fieldsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first upload queue for field recordings")]
#[command(
    long_about = "Offline-first upload queue for field recordings.\n\n\
    Captured sessions, sensor samples and audio files are queued durably and \
    uploaded to the server whenever connectivity allows."
)]
pub struct Cli {
    /// Directory holding the queue, local records and config.toml
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the sync engine until interrupted
    ///
    /// Starts the connectivity probe, the sync coordinator and the queue
    /// processor. Logs go to fieldsync.log in the data directory.
    Run,

    /// Run one sync pass, then upload everything that is ready
    ///
    /// --only and --no-audio replace the [sync.filter] from config.toml for
    /// this pass.
    #[command(after_help = "\
Examples:
  fieldsync sync                  Enqueue new records and drain the queue
  fieldsync sync --only session   Upload session metadata only
  fieldsync sync --no-audio       Skip audio files, e.g. on a metered link
  fieldsync sync -o json          Print the pass and queue summary as JSON")]
    Sync {
        /// Only enqueue records of this type (repeatable)
        #[arg(long, value_parser = parse_item_type, value_name = "TYPE")]
        only: Vec<ItemType>,

        /// Do not enqueue audio files
        #[arg(long)]
        no_audio: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show pending records, queue statistics and sync pass totals
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show recent sync passes
    #[command(after_help = "\
Examples:
  fieldsync history            Show the 20 most recent passes
  fieldsync history -n 5       Show the 5 most recent passes
  fieldsync history --clear    Delete the pass history")]
    History {
        /// Maximum number of passes
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Delete the recorded history
        #[arg(long, conflicts_with = "limit")]
        clear: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List sync items
    #[command(after_help = "\
Examples:
  fieldsync list                     List every item, next to dispatch first
  fieldsync list --status failed     List failed items
  fieldsync list -t audio -n 10      List up to 10 audio items")]
    List {
        /// Filter by status (pending, in_progress, completed, failed)
        #[arg(long, short, value_parser = parse_status)]
        status: Option<ItemStatus>,

        /// Filter by item type
        #[arg(long = "type", short = 't', value_parser = parse_item_type)]
        item_type: Option<ItemType>,

        /// Maximum number of items
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Add an item to the upload queue
    #[command(
        arg_required_else_help = true,
        after_help = "\
Examples:
  fieldsync enqueue session s1 s1                Queue session s1
  fieldsync enqueue sensor_data s1 d1,d2,d3      Queue a batch of samples
  fieldsync enqueue audio s1 a1 --priority 3     Queue an audio file as urgent"
    )]
    Enqueue {
        /// Item type (session, sensor_data, audio, step_event, step_count, file)
        #[arg(value_parser = parse_item_type)]
        item_type: ItemType,

        /// Session the item belongs to
        #[arg(value_parser = non_empty_string)]
        session_id: String,

        /// Local record id, or comma-separated ids for a batch
        #[arg(value_parser = non_empty_string)]
        item_id: String,

        /// Dispatch priority; higher goes first
        #[arg(long, short = 'p', allow_negative_numbers = true)]
        priority: Option<i64>,

        /// Retry ceiling (defaults to queue.max_retries)
        #[arg(long)]
        max_retries: Option<u32>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Return failed items to pending with a fresh retry budget
    RetryFailed,

    /// Delete finished items from the queue
    ///
    /// Without flags, both completed and expired items are removed.
    Cleanup {
        /// Delete completed items
        #[arg(long)]
        completed: bool,

        /// Delete failed items that exhausted their retries
        #[arg(long)]
        expired: bool,
    },

    /// Import local records from a JSON-lines file
    #[command(after_help = "\
Each line is one record tagged by kind:
  {\"kind\":\"session\",\"id\":\"s1\",\"session_id\":\"s1\",\"start_time\":1700000000000}
  {\"kind\":\"sensor_data\",\"id\":\"d1\",\"session_id\":\"s1\",\"sensor_type\":\"gps\",\"timestamp\":1700000000100}
  {\"kind\":\"audio\",\"id\":\"a1\",\"session_id\":\"s1\",\"timestamp\":1700000000200,\"file_path\":\"/rec/a1.m4a\"}")]
    Import {
        /// Path to the JSONL file
        file: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
