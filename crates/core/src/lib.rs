// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync-core: Durable state for the fieldsync offline sync engine
//!
//! This crate provides the sync item model, the SQLite-backed sync item
//! store, and the local record database that the sync engine reconciles
//! against a remote server.

pub mod clock;
pub mod error;
pub mod filter;
pub mod history;
pub mod id;
pub mod item;
pub mod jsonl;
pub mod local;
pub mod records;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use filter::SyncFilter;
pub use history::{PassStatistics, SyncPass, PASS_HISTORY_LIMIT};
pub use item::{
    priority, ItemStatus, ItemType, NewSyncItem, QueueProgress, QueueStats, SyncItem,
    DEFAULT_MAX_RETRIES,
};
pub use local::{LocalDatabase, PendingCounts, StoredRecord};
pub use records::{AudioRecording, LocalRecord, RecordingSession, SensorDataRecord};
pub use store::SyncItemStore;
