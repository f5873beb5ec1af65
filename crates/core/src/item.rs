// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync item types.
//!
//! A [`SyncItem`] is one durable unit of upload work. Its [`ItemType`] selects
//! the handler that performs the transfer and its [`ItemStatus`] follows the
//! queue state machine:
//!
//! ```text
//! pending ──dispatch──► in_progress ──ok──► completed
//!    ▲                      │
//!    └──── retries left ────┤
//!                           └── exhausted ──► failed
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default retry ceiling for new items.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Kind of local data a sync item uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Recording session metadata.
    Session,
    /// A batch of sensor-data records from one session.
    SensorData,
    /// An audio recording file.
    Audio,
    /// Step detector events.
    StepEvent,
    /// Step counter samples.
    StepCount,
    /// An arbitrary file attachment.
    File,
}

impl ItemType {
    /// All item types, in declaration order.
    pub const ALL: [ItemType; 6] = [
        ItemType::Session,
        ItemType::SensorData,
        ItemType::Audio,
        ItemType::StepEvent,
        ItemType::StepCount,
        ItemType::File,
    ];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Session => "session",
            ItemType::SensorData => "sensor_data",
            ItemType::Audio => "audio",
            ItemType::StepEvent => "step_event",
            ItemType::StepCount => "step_count",
            ItemType::File => "file",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "session" => Ok(ItemType::Session),
            "sensor_data" => Ok(ItemType::SensorData),
            "audio" => Ok(ItemType::Audio),
            "step_event" => Ok(ItemType::StepEvent),
            "step_count" => Ok(ItemType::StepCount),
            "file" => Ok(ItemType::File),
            _ => Err(Error::InvalidItemType(s.to_string())),
        }
    }
}

/// Lifecycle status of a sync item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Waiting for dispatch (possibly delayed by `next_retry_at`).
    Pending,
    /// Currently held by a processor pass.
    InProgress,
    /// Uploaded successfully.
    Completed,
    /// Failed. Terminal once `retry_count` reaches `max_retries`.
    Failed,
}

impl ItemStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Completed => "completed",
            ItemStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(ItemStatus::Pending),
            "in_progress" => Ok(ItemStatus::InProgress),
            "completed" => Ok(ItemStatus::Completed),
            "failed" => Ok(ItemStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Named priority levels. Higher values are served first.
pub mod priority {
    pub const LOW: i64 = 0;
    pub const NORMAL: i64 = 1;
    pub const HIGH: i64 = 2;
    pub const URGENT: i64 = 3;
}

/// A durable unit of pending upload work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    /// Unique identifier (format: `sq-{hash}`).
    pub id: String,
    /// Owning recording session.
    pub session_id: String,
    /// Selects the upload handler.
    pub item_type: ItemType,
    /// Local record reference; batches are comma-separated record IDs.
    pub item_id: String,
    pub status: ItemStatus,
    pub priority: i64,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Last failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<i64>,
    /// Earliest dispatch time while pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_retry_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SyncItem {
    /// Returns the local record IDs this item covers.
    pub fn record_ids(&self) -> Vec<String> {
        split_record_ids(&self.item_id)
    }

    /// Returns true if this item is eligible for dispatch at `now_ms`.
    pub fn is_ready(&self, now_ms: i64) -> bool {
        match self.next_retry_at {
            _ if self.status != ItemStatus::Pending => false,
            Some(at) => at <= now_ms,
            None => true,
        }
    }

    /// Returns true if this item failed and has no retries left.
    pub fn is_expired(&self) -> bool {
        self.status == ItemStatus::Failed && self.retry_count >= self.max_retries
    }
}

/// Separates record IDs inside a batched `item_id`.
pub const RECORD_ID_SEPARATOR: char = ',';

/// Checks that a local record id survives batching in an `item_id`.
///
/// Ids must be non-empty, carry no surrounding whitespace and never contain
/// [`RECORD_ID_SEPARATOR`].
pub fn validate_record_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidInput("record id must not be empty".to_string()));
    }
    if id.contains(RECORD_ID_SEPARATOR) {
        return Err(Error::InvalidInput(format!(
            "record id '{id}' contains '{RECORD_ID_SEPARATOR}'\n  hint: record ids are joined with '{RECORD_ID_SEPARATOR}' in batch uploads"
        )));
    }
    if id.trim() != id {
        return Err(Error::InvalidInput(format!(
            "record id '{id}' has leading or trailing whitespace"
        )));
    }
    Ok(())
}

/// Encodes a batch of record IDs into a single `item_id`.
pub fn join_record_ids<S: AsRef<str>>(ids: &[S]) -> String {
    let sep = RECORD_ID_SEPARATOR.to_string();
    ids.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(&sep)
}

/// Decodes an `item_id` into the record IDs it references.
pub fn split_record_ids(item_id: &str) -> Vec<String> {
    item_id
        .split(RECORD_ID_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parameters for creating a new sync item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncItem {
    pub session_id: String,
    pub item_type: ItemType,
    pub item_id: String,
    pub priority: Option<i64>,
    pub max_retries: Option<u32>,
}

impl NewSyncItem {
    pub fn new(session_id: impl Into<String>, item_type: ItemType, item_id: impl Into<String>) -> Self {
        NewSyncItem {
            session_id: session_id.into(),
            item_type,
            item_id: item_id.into(),
            priority: None,
            max_retries: None,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// Aggregate counts over the whole queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    /// Failed items still under their retry ceiling.
    pub retryable: usize,
    /// Failed items at their retry ceiling.
    pub expired: usize,
}

/// Progress snapshot pushed to observers after every transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueProgress {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

impl From<QueueStats> for QueueProgress {
    fn from(stats: QueueStats) -> Self {
        QueueProgress {
            total: stats.total,
            pending: stats.pending,
            in_progress: stats.in_progress,
            completed: stats.completed,
            failed: stats.failed,
        }
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
