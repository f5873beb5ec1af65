// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync pass history types.
//!
//! Passes are persisted by [`SyncItemStore::record_pass`](crate::SyncItemStore::record_pass)
//! next to the queue. Only the newest [`PASS_HISTORY_LIMIT`] passes are kept.

use serde::{Deserialize, Serialize};

/// Passes retained in the history table.
pub const PASS_HISTORY_LIMIT: usize = 500;

/// One reconciliation pass that ran to the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPass {
    /// Epoch milliseconds.
    pub started_at: i64,
    pub duration_ms: i64,
    pub success: bool,
    /// Sync items the pass created.
    pub enqueued: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregates over the retained pass history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub items_enqueued: usize,
    pub average_duration_ms: i64,
    pub last_pass_at: Option<i64>,
    pub last_success_at: Option<i64>,
}
