// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration management for fieldsync.
//!
//! Configuration is stored in `<data_dir>/config.toml` with four sections:
//! - `[server]`: endpoint, auth and transport retry policy
//! - `[sync]`: coordinator options, with selective sync under `[sync.filter]`
//! - `[queue]`: processor options
//! - `[network]`: connectivity probe
//!
//! Every field has a default, so a missing file or section is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use fieldsync_core::SyncFilter;

use crate::sync::{ConnectionType, HttpConfig, ProcessorConfig, RetryPolicy, SyncOptions};

const CONFIG_FILE_NAME: &str = "config.toml";
const QUEUE_DB_NAME: &str = "queue.db";
const LOCAL_DB_NAME: &str = "local.db";
const LOG_FILE_NAME: &str = "fieldsync.log";

/// Server endpoint and transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Transport-level retries for idempotent requests.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Send the sync item id as `Idempotency-Key`, making POSTs retryable.
    #[serde(default)]
    pub idempotency_keys: bool,

    #[serde(default = "default_health_path")]
    pub health_path: String,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_health_path() -> String {
    "/health".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            auth_token: None,
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            idempotency_keys: false,
            health_path: default_health_path(),
        }
    }
}

/// Coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub auto_sync: bool,

    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,

    #[serde(default)]
    pub wifi_only: bool,

    /// Maximum sensor samples per sync item.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default, skip_serializing_if = "SyncFilter::is_unrestricted")]
    pub filter: SyncFilter,
}

fn default_true() -> bool {
    true
}

fn default_sync_interval_secs() -> u64 {
    60
}

fn default_batch_size() -> usize {
    100
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            auto_sync: true,
            sync_interval_secs: default_sync_interval_secs(),
            wifi_only: false,
            batch_size: default_batch_size(),
            filter: SyncFilter::default(),
        }
    }
}

/// Queue processor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_concurrency() -> usize {
    1
}

fn default_retry_delay_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    fieldsync_core::DEFAULT_MAX_RETRIES
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            concurrency: default_concurrency(),
            retry_delay_secs: default_retry_delay_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Connectivity probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Link type reported while the probe sees the server.
    #[serde(default = "default_connection_type")]
    pub connection_type: ConnectionType,

    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

fn default_connection_type() -> ConnectionType {
    ConnectionType::Wifi
}

fn default_probe_interval_secs() -> u64 {
    15
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            connection_type: default_connection_type(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

/// Effective fieldsync configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Loads `config.toml` from the data directory. A missing file yields
    /// the defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        Self::parse(&content)
    }

    /// Parses and validates a TOML document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync.sync_interval_secs == 0 {
            return Err(Error::Config(
                "sync.sync_interval_secs must be at least 1".into(),
            ));
        }
        if self.sync.batch_size == 0 {
            return Err(Error::Config("sync.batch_size must be at least 1".into()));
        }
        if self.queue.concurrency == 0 {
            return Err(Error::Config("queue.concurrency must be at least 1".into()));
        }
        if self.server.base_url.trim().is_empty() {
            return Err(Error::Config("server.base_url cannot be empty".into()));
        }
        Ok(())
    }

    /// Applies environment overrides. Values are passed in so the merge stays
    /// independent of the process environment.
    pub fn with_overrides(mut self, base_url: Option<String>, auth_token: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.server.base_url = url;
        }
        if auth_token.is_some() {
            self.server.auth_token = auth_token;
        }
        self
    }

    pub fn http_config(&self) -> HttpConfig {
        let server = &self.server;
        HttpConfig {
            base_url: server.base_url.clone(),
            timeout: Duration::from_secs(server.timeout_secs),
            auth_token: server.auth_token.clone(),
            retry: RetryPolicy {
                max_retries: server.retry_attempts,
                base_delay: Duration::from_millis(server.retry_base_delay_ms),
                max_delay: Duration::from_millis(server.retry_max_delay_ms),
            },
            idempotency_keys: server.idempotency_keys,
        }
    }

    /// Processor configuration. `auto_process` follows `auto_sync`.
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            concurrency: self.queue.concurrency,
            retry_delay: Duration::from_secs(self.queue.retry_delay_secs),
            max_retries: self.queue.max_retries,
            auto_process: self.sync.auto_sync,
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            auto_sync: self.sync.auto_sync,
            sync_interval: Duration::from_secs(self.sync.sync_interval_secs),
            wifi_only: self.sync.wifi_only,
            batch_size: self.sync.batch_size,
            filter: self.sync.filter.clone(),
        }
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.network.probe_interval_secs.max(1))
    }

    /// Renders the configuration as TOML with the auth token masked.
    pub fn to_display_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.server.auth_token.is_some() {
            shown.server.auth_token = Some("********".to_string());
        }
        toml::to_string_pretty(&shown)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
    }
}

/// Picks the data directory: explicit flag, then `FIELDSYNC_DATA_DIR`, then
/// the platform data directory.
pub fn resolve_data_dir(flag: Option<PathBuf>, env: Option<PathBuf>) -> Result<PathBuf> {
    flag.or(env)
        .or_else(|| dirs::data_dir().map(|d| d.join("fieldsync")))
        .ok_or(Error::NoDataDir)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

pub fn queue_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(QUEUE_DB_NAME)
}

pub fn local_db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOCAL_DB_NAME)
}

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE_NAME)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
