// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod enqueue;
pub mod history;
pub mod import;
pub mod list;
pub mod maintenance;
pub mod run;
pub mod status;
pub mod sync;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use fieldsync_core::{LocalDatabase, SyncItemStore};
use serde::Serialize;

use crate::config::{local_db_path, queue_db_path, resolve_data_dir, Config};
use crate::env;
use crate::error::Result;
use crate::sync::{
    register_upload_handlers, FsProbe, HttpClient, NetworkState, NetworkWatch, QueueProcessor,
    Repositories, ReqwestClient, SyncCoordinator,
};

/// Resolved data directory and effective configuration.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
}

impl Context {
    /// Resolves the data directory, creating it if needed, and loads the
    /// configuration with environment overrides applied.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir, env::data_dir())?;
        fs::create_dir_all(&data_dir)?;
        let config = Config::load(&data_dir)?.with_overrides(env::base_url(), env::auth_token());
        config.validate()?;
        Ok(Context { data_dir, config })
    }

    pub fn open_store(&self) -> Result<Arc<SyncItemStore>> {
        Ok(Arc::new(SyncItemStore::open(&queue_db_path(&self.data_dir))?))
    }

    pub fn open_local(&self) -> Result<Arc<LocalDatabase>> {
        Ok(Arc::new(LocalDatabase::open(&local_db_path(&self.data_dir))?))
    }

    /// A processor that only dispatches when driven explicitly.
    pub fn manual_processor(&self) -> Result<QueueProcessor> {
        let mut config = self.config.processor_config();
        config.auto_process = false;
        Ok(QueueProcessor::new(self.open_store()?, config))
    }
}

/// The wired sync engine: store, repositories, handlers and coordinator.
pub struct Engine {
    pub client: Arc<dyn HttpClient>,
    pub network: NetworkWatch,
    pub processor: QueueProcessor,
    pub coordinator: SyncCoordinator,
}

impl Engine {
    /// Builds the engine against the real server. With `auto_process` off
    /// the caller drives the processor itself.
    pub fn build(ctx: &Context, auto_process: bool) -> Result<Self> {
        let client: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new(ctx.config.http_config())?);
        Self::with_client(ctx, client, auto_process)
    }

    pub fn with_client(
        ctx: &Context,
        client: Arc<dyn HttpClient>,
        auto_process: bool,
    ) -> Result<Self> {
        let mut processor_config = ctx.config.processor_config();
        processor_config.auto_process = auto_process;
        let processor = QueueProcessor::new(ctx.open_store()?, processor_config);

        let repos = Repositories::local(ctx.open_local()?);
        register_upload_handlers(&processor, client.clone(), &repos, Arc::new(FsProbe));

        let network = NetworkWatch::new(NetworkState::offline());
        let coordinator = SyncCoordinator::new(
            processor.clone(),
            repos,
            Arc::new(network.clone()),
            ctx.config.sync_options(),
        );
        Ok(Engine {
            client,
            network,
            processor,
            coordinator,
        })
    }
}

/// Prints `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats epoch milliseconds for text output.
pub(crate) fn format_time(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
