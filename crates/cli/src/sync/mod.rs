// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline sync engine.
//!
//! Reconciles locally captured records with the remote server under
//! intermittent connectivity.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Coordinator │────►│  Processor  │────►│  Handlers   │────►│ HttpClient  │
//! │ (scan/batch)│     │ (dispatch)  │     │ (per type)  │     │   (trait)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Network   │     │ SyncItem    │     │ Repositories│
//! │  (watch)    │     │ Store       │     │ (local db)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Features
//!
//! - Durable queue: every transition is persisted before the loop advances
//! - Priority dispatch with bounded concurrency
//! - Fixed per-item retry delay, separate from transport backoff
//! - Wi-Fi-only mode and connectivity-triggered passes
//! - Injectable client, repository, and file-probe traits for testing

mod coordinator;
mod handlers;
mod network;
mod processor;
mod repository;
mod transport;

pub use coordinator::{
    SkipReason, SyncCoordinator, SyncOptions, SyncOptionsUpdate, SyncOutcome, SyncReport,
    SyncStatus, MIN_SYNC_INTERVAL,
};
pub use handlers::{
    register_upload_handlers, AudioUploadHandler, FileProbe, FsProbe, HandlerError,
    HandlerResult, SensorDataUploadHandler, SessionUploadHandler, UploadHandler,
};
pub use network::{
    probe_once, spawn_probe, ConnectionType, NetworkMonitor, NetworkState, NetworkWatch,
};
pub use processor::{
    ProcessError, ProcessResult, ProcessSummary, ProcessorConfig, ProgressObserver,
    QueueProcessor, NO_HANDLER_MESSAGE,
};
pub use repository::{
    LocalRepository, RecordRepository, Repositories, RepositoryError, RepositoryResult,
};
pub use transport::{
    ApiError, ApiResult, HttpClient, HttpConfig, ReqwestClient, RetryPolicy, UploadForm,
    DECODE_ERROR, IO_ERROR, NETWORK_ERROR,
};

#[cfg(test)]
pub(crate) mod test_helpers;
