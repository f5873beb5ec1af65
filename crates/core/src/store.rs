// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable store for sync items.
//!
//! The [`SyncItemStore`] is the single source of truth for item status. Every
//! state transition is written through before the caller continues, so a
//! crash mid-dispatch leaves the item `in_progress` rather than losing it.
//! [`SyncItemStore::open`] requeues such interrupted items.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::clock::{ClockSource, SystemClock};
use crate::error::{Error, Result};
use crate::history::{PassStatistics, SyncPass, PASS_HISTORY_LIMIT};
use crate::id::generate_unique_id;
use crate::item::{
    split_record_ids, ItemStatus, ItemType, NewSyncItem, QueueStats, SyncItem,
    DEFAULT_MAX_RETRIES,
};

/// SQL schema for the sync queue.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sync_queue (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    item_type TEXT NOT NULL,
    item_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    priority INTEGER NOT NULL DEFAULT 0,
    retry_count INTEGER NOT NULL DEFAULT 0,
    max_retries INTEGER NOT NULL DEFAULT 3,
    error_message TEXT,
    last_attempt_at INTEGER,
    completed_at INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    CHECK (retry_count <= max_retries)
);

CREATE INDEX IF NOT EXISTS idx_sync_queue_status ON sync_queue(status);
CREATE INDEX IF NOT EXISTS idx_sync_queue_dispatch ON sync_queue(status, priority DESC, created_at ASC);
CREATE INDEX IF NOT EXISTS idx_sync_queue_session ON sync_queue(session_id);
CREATE INDEX IF NOT EXISTS idx_sync_queue_item ON sync_queue(item_type, item_id);

CREATE TABLE IF NOT EXISTS sync_passes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL,
    success INTEGER NOT NULL,
    enqueued INTEGER NOT NULL,
    error TEXT
);
"#;

const SELECT_COLUMNS: &str = "id, session_id, item_type, item_id, status, priority,
    retry_count, max_retries, error_message, last_attempt_at, next_retry_at,
    completed_at, created_at, updated_at";

/// Dispatch order: highest priority first, then oldest, then insertion order.
const DISPATCH_ORDER: &str = "ORDER BY priority DESC, created_at ASC, rowid ASC";

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

fn row_to_item(row: &Row<'_>) -> std::result::Result<SyncItem, rusqlite::Error> {
    let type_str: String = row.get(2)?;
    let status_str: String = row.get(4)?;

    Ok(SyncItem {
        id: row.get(0)?,
        session_id: row.get(1)?,
        item_type: parse_db(&type_str, "item_type")?,
        item_id: row.get(3)?,
        status: parse_db(&status_str, "status")?,
        priority: row.get(5)?,
        retry_count: row.get(6)?,
        max_retries: row.get(7)?,
        error_message: row.get(8)?,
        last_attempt_at: row.get(9)?,
        next_retry_at: row.get(10)?,
        completed_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Run schema creation and all migrations on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_next_retry_at(conn)?;
    Ok(())
}

/// Migration: Add next_retry_at column to queues created before retry scheduling.
fn migrate_add_next_retry_at(conn: &Connection) -> Result<()> {
    let has_column: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info('sync_queue') WHERE name = 'next_retry_at'",
        [],
        |row| row.get(0),
    )?;

    if !has_column {
        conn.execute("ALTER TABLE sync_queue ADD COLUMN next_retry_at INTEGER", [])?;
    }
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sync_queue_retry ON sync_queue(next_retry_at)",
        [],
    )?;
    Ok(())
}

/// Durable CRUD and query surface for [`SyncItem`]s.
pub struct SyncItemStore {
    conn: Mutex<Connection>,
    clock: Arc<dyn ClockSource>,
}

impl SyncItemStore {
    /// Open the store at the given path, creating and migrating if needed.
    ///
    /// Items left `in_progress` by a previous process are requeued.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        run_migrations(&conn)?;

        let store = SyncItemStore {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        };
        store.recover_interrupted()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(SyncItemStore {
            conn: Mutex::new(conn),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for timestamps and readiness checks.
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to the store's clock.
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn query_items(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SyncItem>> {
        let mut stmt = conn.prepare(sql)?;
        let items = stmt
            .query_map(params, row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn item_exists(conn: &Connection, id: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sync_queue WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_in(conn: &Connection, id: &str) -> Result<SyncItem> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM sync_queue WHERE id = ?1");
        conn.query_row(&sql, params![id], row_to_item)
            .optional()?
            .ok_or_else(|| Error::ItemNotFound(id.to_string()))
    }

    /// Create a new pending item.
    pub fn create(&self, new: NewSyncItem) -> Result<SyncItem> {
        if new.session_id.trim().is_empty() {
            return Err(Error::InvalidInput("session id cannot be empty".into()));
        }
        if new.item_id.trim().is_empty() {
            return Err(Error::InvalidInput("item id cannot be empty".into()));
        }

        let now = self.now_ms();
        let conn = self.conn();
        let id = generate_unique_id(&new.session_id, new.item_type, &new.item_id, now, |c| {
            Self::item_exists(&conn, c)
        })?;

        let item = SyncItem {
            id,
            session_id: new.session_id,
            item_type: new.item_type,
            item_id: new.item_id,
            status: ItemStatus::Pending,
            priority: new.priority.unwrap_or(0),
            retry_count: 0,
            max_retries: new.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            error_message: None,
            last_attempt_at: None,
            next_retry_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO sync_queue (id, session_id, item_type, item_id, status, priority,
             retry_count, max_retries, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                item.id,
                item.session_id,
                item.item_type.as_str(),
                item.item_id,
                item.status.as_str(),
                item.priority,
                item.retry_count,
                item.max_retries,
                item.created_at,
                item.updated_at,
            ],
        )?;
        Ok(item)
    }

    /// Get an item by ID.
    pub fn get(&self, id: &str) -> Result<SyncItem> {
        Self::get_in(&self.conn(), id)
    }

    /// Find an item by ID, returning `None` if it does not exist.
    pub fn find_by_id(&self, id: &str) -> Result<Option<SyncItem>> {
        match self.get(id) {
            Ok(item) => Ok(Some(item)),
            Err(Error::ItemNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Find the item referencing a given local record (or batch).
    pub fn find_by_item(&self, item_type: ItemType, item_id: &str) -> Result<Option<SyncItem>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM sync_queue
             WHERE item_type = ?1 AND item_id = ?2 {DISPATCH_ORDER} LIMIT 1"
        );
        let item = self
            .conn()
            .query_row(&sql, params![item_type.as_str(), item_id], row_to_item)
            .optional()?;
        Ok(item)
    }

    /// Pending items whose retry delay (if any) has elapsed, in dispatch order.
    pub fn find_ready_to_sync(&self, limit: Option<usize>) -> Result<Vec<SyncItem>> {
        let now = self.now_ms();
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM sync_queue
             WHERE status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= ?1)
             {DISPATCH_ORDER} LIMIT ?2"
        );
        Self::query_items(&self.conn(), &sql, params![now, limit])
    }

    /// Returns true if at least one item is ready for dispatch.
    pub fn has_ready(&self) -> Result<bool> {
        Ok(!self.find_ready_to_sync(Some(1))?.is_empty())
    }

    /// Earliest future `next_retry_at` among pending items.
    pub fn next_retry_due(&self) -> Result<Option<i64>> {
        let now = self.now_ms();
        let due: Option<i64> = self.conn().query_row(
            "SELECT MIN(next_retry_at) FROM sync_queue
             WHERE status = 'pending' AND next_retry_at > ?1",
            params![now],
            |row| row.get(0),
        )?;
        Ok(due)
    }

    /// Items with the given status, in dispatch order.
    pub fn find_by_status(&self, status: ItemStatus) -> Result<Vec<SyncItem>> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM sync_queue WHERE status = ?1 {DISPATCH_ORDER}");
        Self::query_items(&self.conn(), &sql, params![status.as_str()])
    }

    /// Items owned by a recording session, in dispatch order.
    pub fn find_by_session(&self, session_id: &str) -> Result<Vec<SyncItem>> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM sync_queue WHERE session_id = ?1 {DISPATCH_ORDER}");
        Self::query_items(&self.conn(), &sql, params![session_id])
    }

    /// All items, in dispatch order.
    pub fn find_all(&self) -> Result<Vec<SyncItem>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM sync_queue {DISPATCH_ORDER}");
        Self::query_items(&self.conn(), &sql, [])
    }

    /// Failed items still under their retry ceiling.
    pub fn find_retryable(&self) -> Result<Vec<SyncItem>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM sync_queue
             WHERE status = 'failed' AND retry_count < max_retries {DISPATCH_ORDER}"
        );
        Self::query_items(&self.conn(), &sql, [])
    }

    /// Failed items that exhausted their retry budget.
    pub fn find_expired(&self) -> Result<Vec<SyncItem>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM sync_queue
             WHERE status = 'failed' AND retry_count >= max_retries {DISPATCH_ORDER}"
        );
        Self::query_items(&self.conn(), &sql, [])
    }

    /// Claim a pending item for dispatch.
    ///
    /// Returns `Ok(false)` if the item exists but is not pending (already
    /// claimed, completed or failed).
    pub fn mark_in_progress(&self, id: &str) -> Result<bool> {
        let now = self.now_ms();
        let conn = self.conn();
        let affected = conn.execute(
            "UPDATE sync_queue SET status = 'in_progress', last_attempt_at = ?1, updated_at = ?1
             WHERE id = ?2 AND status = 'pending'",
            params![now, id],
        )?;
        if affected == 0 && !Self::item_exists(&conn, id)? {
            return Err(Error::ItemNotFound(id.to_string()));
        }
        Ok(affected > 0)
    }

    /// Mark an item completed. Completing an already completed item is a no-op.
    pub fn mark_completed(&self, id: &str) -> Result<()> {
        let now = self.now_ms();
        let conn = self.conn();
        let affected = conn.execute(
            "UPDATE sync_queue SET status = 'completed', completed_at = ?1, updated_at = ?1,
             error_message = NULL, next_retry_at = NULL
             WHERE id = ?2 AND status != 'completed'",
            params![now, id],
        )?;
        if affected == 0 && !Self::item_exists(&conn, id)? {
            return Err(Error::ItemNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Record a failed attempt.
    ///
    /// Increments `retry_count`; below the ceiling the item goes back to
    /// `pending` with `next_retry_at = now + retry_delay_ms`, otherwise it
    /// stays `failed` for good.
    pub fn mark_failed(&self, id: &str, message: &str, retry_delay_ms: i64) -> Result<SyncItem> {
        let now = self.now_ms();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let item = Self::get_in(&tx, id)?;

        let attempts = item.retry_count.saturating_add(1);
        let (status, retry_count, next_retry_at) = if attempts < item.max_retries {
            (ItemStatus::Pending, attempts, Some(now + retry_delay_ms.max(0)))
        } else {
            (ItemStatus::Failed, item.max_retries, None)
        };

        tx.execute(
            "UPDATE sync_queue SET status = ?1, retry_count = ?2, error_message = ?3,
             last_attempt_at = ?4, next_retry_at = ?5, updated_at = ?4
             WHERE id = ?6",
            params![status.as_str(), retry_count, message, now, next_retry_at, id],
        )?;
        let updated = Self::get_in(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Fail an item immediately with no further retries.
    pub fn mark_exhausted(&self, id: &str, message: &str) -> Result<SyncItem> {
        let now = self.now_ms();
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let affected = tx.execute(
            "UPDATE sync_queue SET status = 'failed', retry_count = max_retries,
             error_message = ?1, last_attempt_at = ?2, next_retry_at = NULL, updated_at = ?2
             WHERE id = ?3",
            params![message, now, id],
        )?;
        if affected == 0 {
            return Err(Error::ItemNotFound(id.to_string()));
        }
        let updated = Self::get_in(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Reset a single item to pending for a manual retry.
    pub fn reset_to_pending(&self, id: &str) -> Result<()> {
        let now = self.now_ms();
        let affected = self.conn().execute(
            "UPDATE sync_queue SET status = 'pending', retry_count = 0, error_message = NULL,
             next_retry_at = NULL, updated_at = ?1
             WHERE id = ?2",
            params![now, id],
        )?;
        if affected == 0 {
            return Err(Error::ItemNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Reset every failed item to pending with a fresh retry budget.
    pub fn reset_failed(&self) -> Result<usize> {
        let now = self.now_ms();
        let affected = self.conn().execute(
            "UPDATE sync_queue SET status = 'pending', retry_count = 0, error_message = NULL,
             next_retry_at = NULL, updated_at = ?1
             WHERE status = 'failed'",
            params![now],
        )?;
        Ok(affected)
    }

    /// Return a claimed item to `pending` without spending a retry.
    ///
    /// Used when dispatch is abandoned before the handler ran. Returns
    /// `Ok(false)` if the item is no longer `in_progress`.
    pub fn release_claim(&self, id: &str) -> Result<bool> {
        let now = self.now_ms();
        let affected = self.conn().execute(
            "UPDATE sync_queue SET status = 'pending', updated_at = ?1
             WHERE id = ?2 AND status = 'in_progress'",
            params![now, id],
        )?;
        Ok(affected > 0)
    }

    /// Requeue items left `in_progress` by an interrupted process.
    pub fn recover_interrupted(&self) -> Result<usize> {
        let now = self.now_ms();
        let affected = self.conn().execute(
            "UPDATE sync_queue SET status = 'pending', next_retry_at = NULL, updated_at = ?1
             WHERE status = 'in_progress'",
            params![now],
        )?;
        if affected > 0 {
            tracing::warn!("requeued {} interrupted sync items", affected);
        }
        Ok(affected)
    }

    /// Delete a single item.
    pub fn delete(&self, id: &str) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM sync_queue WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(Error::ItemNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete all completed items, returning how many were removed.
    pub fn delete_completed(&self) -> Result<usize> {
        let affected = self
            .conn()
            .execute("DELETE FROM sync_queue WHERE status = 'completed'", [])?;
        Ok(affected)
    }

    /// Delete all expired items, returning how many were removed.
    pub fn delete_expired(&self) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sync_queue WHERE status = 'failed' AND retry_count >= max_retries",
            [],
        )?;
        Ok(affected)
    }

    /// Delete every item.
    pub fn clear_all(&self) -> Result<usize> {
        let affected = self.conn().execute("DELETE FROM sync_queue", [])?;
        Ok(affected)
    }

    /// Count items with the given status.
    pub fn count_by_status(&self, status: ItemStatus) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM sync_queue WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Aggregate counts over the whole queue.
    pub fn get_statistics(&self) -> Result<QueueStats> {
        let stats = self.conn().query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'pending'), 0),
                    COALESCE(SUM(status = 'in_progress'), 0),
                    COALESCE(SUM(status = 'completed'), 0),
                    COALESCE(SUM(status = 'failed'), 0),
                    COALESCE(SUM(status = 'failed' AND retry_count < max_retries), 0),
                    COALESCE(SUM(status = 'failed' AND retry_count >= max_retries), 0)
             FROM sync_queue",
            [],
            |row| {
                let get = |i: usize| row.get::<_, i64>(i).map(|v| v as usize);
                Ok(QueueStats {
                    total: get(0)?,
                    pending: get(1)?,
                    in_progress: get(2)?,
                    completed: get(3)?,
                    failed: get(4)?,
                    retryable: get(5)?,
                    expired: get(6)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Local record IDs covered by items of this type that have not completed.
    pub fn active_references(&self, item_type: ItemType) -> Result<HashSet<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT item_id FROM sync_queue WHERE item_type = ?1 AND status != 'completed'",
        )?;
        let item_ids = stmt
            .query_map(params![item_type.as_str()], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(item_ids
            .iter()
            .flat_map(|item_id| split_record_ids(item_id))
            .collect())
    }

    /// Append a finished pass to the history, dropping the oldest entries
    /// beyond [`PASS_HISTORY_LIMIT`].
    pub fn record_pass(&self, pass: &SyncPass) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO sync_passes (started_at, duration_ms, success, enqueued, error)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pass.started_at,
                pass.duration_ms,
                pass.success,
                pass.enqueued as i64,
                pass.error,
            ],
        )?;
        tx.execute(
            "DELETE FROM sync_passes WHERE id <= (
                 SELECT id FROM sync_passes ORDER BY id DESC LIMIT 1 OFFSET ?1
             )",
            params![PASS_HISTORY_LIMIT as i64],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// The most recent passes, newest first.
    pub fn recent_passes(&self, limit: usize) -> Result<Vec<SyncPass>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT started_at, duration_ms, success, enqueued, error
             FROM sync_passes ORDER BY id DESC LIMIT ?1",
        )?;
        let passes = stmt
            .query_map(params![limit as i64], |row| {
                Ok(SyncPass {
                    started_at: row.get(0)?,
                    duration_ms: row.get(1)?,
                    success: row.get(2)?,
                    enqueued: row.get::<_, i64>(3)? as usize,
                    error: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(passes)
    }

    /// Aggregate counts over the retained pass history.
    pub fn pass_statistics(&self) -> Result<PassStatistics> {
        let stats = self.conn().query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(success), 0),
                    COALESCE(SUM(enqueued), 0),
                    CAST(COALESCE(AVG(duration_ms), 0) AS INTEGER),
                    MAX(started_at),
                    MAX(CASE WHEN success THEN started_at END)
             FROM sync_passes",
            [],
            |row| {
                let total = row.get::<_, i64>(0)? as usize;
                let successful = row.get::<_, i64>(1)? as usize;
                Ok(PassStatistics {
                    total,
                    successful,
                    failed: total - successful,
                    items_enqueued: row.get::<_, i64>(2)? as usize,
                    average_duration_ms: row.get(3)?,
                    last_pass_at: row.get(4)?,
                    last_success_at: row.get(5)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Delete the pass history, returning how many passes were removed.
    pub fn clear_passes(&self) -> Result<usize> {
        let affected = self.conn().execute("DELETE FROM sync_passes", [])?;
        Ok(affected)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
