// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: turns unsynchronized local records into sync items.
//!
//! A pass runs on start, on every connectivity change that leaves the device
//! online, and on a periodic timer. Each pass scans the repositories, skips
//! records already covered by an unfinished item, batches sensor samples per
//! session, and enqueues the rest. Per-record failures are logged and
//! reported, never propagated.
//!
//! The [`SyncFilter`] in [`SyncOptions`] narrows what a pass enqueues. Each
//! pass that runs to the end is appended to the store's pass history.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use fieldsync_core::item::{join_record_ids, validate_record_id};
use fieldsync_core::{
    priority, ClockSource, ItemType, NewSyncItem, SensorDataRecord, SyncFilter, SyncPass,
    SystemClock,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::network::NetworkMonitor;
use super::processor::{ProcessError, QueueProcessor};
use super::repository::{Repositories, RepositoryError};

/// Shortest periodic pass interval. Shorter requests are raised to this.
pub const MIN_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Runtime options for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOptions {
    pub auto_sync: bool,
    pub sync_interval: Duration,
    pub wifi_only: bool,
    /// Maximum sensor samples per sync item.
    pub batch_size: usize,
    pub filter: SyncFilter,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            auto_sync: true,
            sync_interval: Duration::from_secs(60),
            wifi_only: false,
            batch_size: 100,
            filter: SyncFilter::default(),
        }
    }
}

impl SyncOptions {
    fn clamped(mut self) -> Self {
        self.sync_interval = self.sync_interval.max(MIN_SYNC_INTERVAL);
        self.batch_size = self.batch_size.max(1);
        self
    }
}

/// Partial update for [`SyncOptions`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptionsUpdate {
    pub auto_sync: Option<bool>,
    pub sync_interval: Option<Duration>,
    pub wifi_only: Option<bool>,
    pub batch_size: Option<usize>,
    pub filter: Option<SyncFilter>,
}

/// Snapshot returned by [`SyncCoordinator::get_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub is_syncing: bool,
    /// Epoch milliseconds of the last fully successful pass.
    pub last_sync_time: Option<i64>,
    pub pending_sessions: usize,
    pub pending_sensor_data: usize,
    pub pending_audio_files: usize,
}

/// Why a pass did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Offline,
    WaitingForWifi,
    AlreadySyncing,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::Offline => "offline",
            SkipReason::WaitingForWifi => "waiting for Wi-Fi",
            SkipReason::AlreadySyncing => "already syncing",
        })
    }
}

/// Items enqueued by one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub sessions: usize,
    pub sensor_batches: usize,
    pub audio_files: usize,
    /// Records skipped because their id cannot be referenced by a sync item.
    pub rejected: usize,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn enqueued(&self) -> usize {
        self.sessions + self.sensor_batches + self.audio_files
    }
}

/// Result of [`SyncCoordinator::sync`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Skipped { reason: SkipReason },
    Completed(SyncReport),
}

#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

impl From<fieldsync_core::Error> for StepError {
    fn from(e: fieldsync_core::Error) -> Self {
        StepError::Process(e.into())
    }
}

struct Triggers {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

struct Inner {
    processor: QueueProcessor,
    repos: Repositories,
    network: Arc<dyn NetworkMonitor>,
    clock: Arc<dyn ClockSource>,
    options: RwLock<SyncOptions>,
    syncing: AtomicBool,
    last_sync_time: Mutex<Option<i64>>,
    triggers: Mutex<Option<Triggers>>,
}

/// Coordinates reconciliation passes. Cheap to clone.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    pub fn new(
        processor: QueueProcessor,
        repos: Repositories,
        network: Arc<dyn NetworkMonitor>,
        options: SyncOptions,
    ) -> Self {
        SyncCoordinator {
            inner: Arc::new(Inner {
                processor,
                repos,
                network,
                clock: Arc::new(SystemClock),
                options: RwLock::new(options.clamped()),
                syncing: AtomicBool::new(false),
                last_sync_time: Mutex::new(None),
                triggers: Mutex::new(None),
            }),
        }
    }

    /// Replaces the clock used for `last_sync_time`. Only valid before the
    /// coordinator is shared.
    pub fn with_clock(self, clock: Arc<dyn ClockSource>) -> Self {
        match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.clock = clock;
                SyncCoordinator {
                    inner: Arc::new(inner),
                }
            }
            Err(inner) => SyncCoordinator { inner },
        }
    }

    pub fn processor(&self) -> &QueueProcessor {
        &self.inner.processor
    }

    pub fn options(&self) -> SyncOptions {
        self.inner
            .options
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner
            .triggers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::SeqCst)
    }

    pub fn last_sync_time(&self) -> Option<i64> {
        *self
            .inner
            .last_sync_time
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribes to connectivity, starts the periodic timer, and runs an
    /// immediate pass. Does nothing when `auto_sync` is off or already started.
    pub async fn start(&self) -> Option<SyncOutcome> {
        if !self.options().auto_sync {
            tracing::info!("auto sync disabled, coordinator not started");
            return None;
        }
        if !self.spawn_triggers() {
            return None;
        }
        Some(self.sync().await)
    }

    /// Unsubscribes and cancels the timer. An in-flight pass runs to the end.
    pub fn stop(&self) {
        let triggers = self
            .inner
            .triggers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(triggers) = triggers {
            triggers.cancel.cancel();
            drop(triggers.tasks);
            tracing::info!("sync coordinator stopped");
        }
    }

    fn spawn_triggers(&self) -> bool {
        let mut slot = self
            .inner
            .triggers
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return false;
        }
        let cancel = CancellationToken::new();
        let interval = self.options().sync_interval.max(MIN_SYNC_INTERVAL);

        let watcher = {
            let this = self.clone();
            let cancel = cancel.clone();
            let mut rx = self.inner.network.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let state = *rx.borrow_and_update();
                            if state.is_connected && !this.is_syncing() {
                                tracing::debug!(
                                    "connectivity changed ({}), syncing",
                                    state.connection_type
                                );
                                this.sync().await;
                            }
                        }
                    }
                }
            })
        };

        let timer = {
            let this = self.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            this.sync().await;
                        }
                    }
                }
            })
        };

        *slot = Some(Triggers {
            cancel,
            tasks: vec![watcher, timer],
        });
        tracing::info!("sync coordinator started (interval {}s)", interval.as_secs());
        true
    }

    /// Applies a partial options update. A running coordinator restarts its
    /// triggers when the interval or `auto_sync` changes.
    pub fn update_options(&self, update: SyncOptionsUpdate) -> SyncOptions {
        let (before, after) = {
            let mut options = self
                .inner
                .options
                .write()
                .unwrap_or_else(|e| e.into_inner());
            let before = options.clone();
            if let Some(v) = update.auto_sync {
                options.auto_sync = v;
            }
            if let Some(v) = update.sync_interval {
                options.sync_interval = v.max(MIN_SYNC_INTERVAL);
            }
            if let Some(v) = update.wifi_only {
                options.wifi_only = v;
            }
            if let Some(v) = update.batch_size {
                options.batch_size = v.max(1);
            }
            if let Some(filter) = update.filter {
                options.filter = filter;
            }
            (before, options.clone())
        };

        let restart =
            before.sync_interval != after.sync_interval || before.auto_sync != after.auto_sync;
        if restart && self.is_running() {
            self.stop();
            if after.auto_sync {
                self.spawn_triggers();
            }
        }
        after
    }

    /// Runs one reconciliation pass. Concurrent calls return
    /// [`SkipReason::AlreadySyncing`].
    pub async fn sync(&self) -> SyncOutcome {
        let state = self.inner.network.current();
        if !state.is_connected {
            tracing::debug!("sync skipped: offline");
            return SyncOutcome::Skipped {
                reason: SkipReason::Offline,
            };
        }
        if self.options().wifi_only && !state.is_unmetered() {
            tracing::info!("sync skipped: waiting for Wi-Fi ({})", state.connection_type);
            return SyncOutcome::Skipped {
                reason: SkipReason::WaitingForWifi,
            };
        }
        if self
            .inner
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return SyncOutcome::Skipped {
                reason: SkipReason::AlreadySyncing,
            };
        }

        tracing::info!("sync started");
        let started_at = self.inner.clock.now_ms();
        let timer = tokio::time::Instant::now();
        let report = self.reconcile().await;
        if report.errors.is_empty() {
            *self
                .inner
                .last_sync_time
                .lock()
                .unwrap_or_else(|e| e.into_inner()) = Some(self.inner.clock.now_ms());
        }
        self.record_pass(started_at, timer.elapsed(), &report);
        self.inner.syncing.store(false, Ordering::SeqCst);

        tracing::info!(
            "sync finished: {} sessions, {} sensor batches, {} audio files enqueued, {} errors",
            report.sessions,
            report.sensor_batches,
            report.audio_files,
            report.errors.len()
        );
        self.inner.processor.wake();
        SyncOutcome::Completed(report)
    }

    fn record_pass(&self, started_at: i64, elapsed: Duration, report: &SyncReport) {
        let pass = SyncPass {
            started_at,
            duration_ms: i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            success: report.errors.is_empty(),
            enqueued: report.enqueued(),
            error: (!report.errors.is_empty()).then(|| report.errors.join("; ")),
        };
        if let Err(e) = self.inner.processor.store().record_pass(&pass) {
            tracing::warn!("failed to record sync pass: {}", e);
        }
    }

    async fn reconcile(&self) -> SyncReport {
        let mut report = SyncReport::default();
        let filter = self.options().filter;
        if !filter.is_unrestricted() {
            tracing::debug!("selective sync: {:?}", filter);
        }

        match self.enqueue_sessions(&filter, &mut report.rejected).await {
            Ok(n) => report.sessions = n,
            Err(e) => {
                tracing::warn!("session scan failed: {}", e);
                report.errors.push(format!("sessions: {e}"));
            }
        }
        match self.enqueue_sensor_data(&filter, &mut report.rejected).await {
            Ok(n) => report.sensor_batches = n,
            Err(e) => {
                tracing::warn!("sensor data scan failed: {}", e);
                report.errors.push(format!("sensor data: {e}"));
            }
        }
        match self.enqueue_audio(&filter, &mut report.rejected).await {
            Ok(n) => report.audio_files = n,
            Err(e) => {
                tracing::warn!("audio scan failed: {}", e);
                report.errors.push(format!("audio: {e}"));
            }
        }

        report
    }

    fn active(&self, item_type: ItemType) -> Result<HashSet<String>, StepError> {
        Ok(self.inner.processor.store().active_references(item_type)?)
    }

    async fn enqueue_sessions(
        &self,
        filter: &SyncFilter,
        rejected: &mut usize,
    ) -> Result<usize, StepError> {
        if !filter.allows_type(ItemType::Session) {
            return Ok(0);
        }
        let sessions = self.inner.repos.sessions.find_unuploaded().await?;
        let active = self.active(ItemType::Session)?;
        let mut count = 0;
        let candidates = sessions
            .iter()
            .filter(|s| filter.matches_session(s) && !active.contains(&s.id));
        for session in candidates {
            if !referenceable(ItemType::Session, &session.id, rejected) {
                continue;
            }
            self.inner.processor.enqueue(
                NewSyncItem::new(&session.session_id, ItemType::Session, &session.id)
                    .with_priority(priority::HIGH),
            )?;
            count += 1;
        }
        Ok(count)
    }

    async fn enqueue_sensor_data(
        &self,
        filter: &SyncFilter,
        rejected: &mut usize,
    ) -> Result<usize, StepError> {
        if !filter.allows_type(ItemType::SensorData) {
            return Ok(0);
        }
        let records = self.inner.repos.sensor_data.find_unuploaded().await?;
        let active = self.active(ItemType::SensorData)?;
        let batch_size = self.options().batch_size.max(1);
        let records: Vec<SensorDataRecord> = records
            .into_iter()
            .filter(|r| filter.matches_sample(r))
            .filter(|r| referenceable(ItemType::SensorData, &r.id, rejected))
            .collect();

        let mut count = 0;
        for (session_id, records) in group_by_session(records, &active) {
            for chunk in records.chunks(batch_size) {
                let ids: Vec<&str> = chunk.iter().map(|r| r.id.as_str()).collect();
                self.inner.processor.enqueue(
                    NewSyncItem::new(&session_id, ItemType::SensorData, join_record_ids(&ids))
                        .with_priority(priority::NORMAL),
                )?;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn enqueue_audio(
        &self,
        filter: &SyncFilter,
        rejected: &mut usize,
    ) -> Result<usize, StepError> {
        if !filter.allows_type(ItemType::Audio) {
            return Ok(0);
        }
        let recordings = self.inner.repos.audio.find_unuploaded().await?;
        let active = self.active(ItemType::Audio)?;
        let mut count = 0;
        let candidates = recordings
            .iter()
            .filter(|a| filter.matches_audio(a) && !active.contains(&a.id));
        for recording in candidates {
            if !referenceable(ItemType::Audio, &recording.id, rejected) {
                continue;
            }
            self.inner.processor.enqueue(
                NewSyncItem::new(&recording.session_id, ItemType::Audio, &recording.id)
                    .with_priority(priority::LOW),
            )?;
            count += 1;
        }
        Ok(count)
    }

    pub async fn get_status(&self) -> Result<SyncStatus, RepositoryError> {
        let repos = &self.inner.repos;
        Ok(SyncStatus {
            is_syncing: self.is_syncing(),
            last_sync_time: self.last_sync_time(),
            pending_sessions: repos.sessions.find_unuploaded().await?.len(),
            pending_sensor_data: repos.sensor_data.find_unuploaded().await?.len(),
            pending_audio_files: repos.audio.find_unuploaded().await?.len(),
        })
    }
}

/// Returns false, and counts the record, if its id would not survive being
/// joined into a batch `item_id`.
fn referenceable(item_type: ItemType, id: &str, rejected: &mut usize) -> bool {
    match validate_record_id(id) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("skipping {} record: {}", item_type, e);
            *rejected += 1;
            false
        }
    }
}

/// Groups sensor samples by session, keeping the repository's order within
/// each session and dropping samples already covered by an active item.
fn group_by_session(
    records: Vec<SensorDataRecord>,
    active: &HashSet<String>,
) -> BTreeMap<String, Vec<SensorDataRecord>> {
    let mut groups: BTreeMap<String, Vec<SensorDataRecord>> = BTreeMap::new();
    for record in records.into_iter().filter(|r| !active.contains(&r.id)) {
        groups
            .entry(record.session_id.clone())
            .or_default()
            .push(record);
    }
    groups
}
