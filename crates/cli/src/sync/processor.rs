// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue processor: dispatches ready sync items to their upload handlers.
//!
//! Per-item state machine:
//!
//! ```text
//! pending ──dispatch──► in_progress ──ok──► completed
//!    ▲                      │
//!    └──err, retries left───┤
//!                           └──err, exhausted / non-retryable──► failed
//! ```
//!
//! Every transition is written to the [`SyncItemStore`] before the loop
//! advances. The processor idles when nothing is ready and is woken by
//! [`QueueProcessor::wake`], by `enqueue`, and by a one-shot timer armed for
//! the earliest pending retry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use fieldsync_core::{
    ItemStatus, ItemType, NewSyncItem, QueueProgress, QueueStats, SyncItem, SyncItemStore,
    DEFAULT_MAX_RETRIES,
};
use futures_util::future::join_all;
use tokio::task::JoinHandle;

use super::handlers::{HandlerError, UploadHandler};

/// Message recorded on items whose type has no registered handler.
pub const NO_HANDLER_MESSAGE: &str = "no handler registered";

/// Error type for processor operations. Only store failures surface here;
/// handler failures are absorbed into item state.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("sync store error: {0}")]
    Store(#[from] fieldsync_core::Error),
}

/// Result type for processor operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Configuration for the queue processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Items dispatched together per batch.
    pub concurrency: usize,
    /// Fixed delay before a failed item becomes ready again.
    pub retry_delay: Duration,
    /// Retry ceiling for items enqueued without one.
    pub max_retries: u32,
    /// Start processing automatically on enqueue and wake-ups.
    pub auto_process: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            concurrency: 1,
            retry_delay: Duration::from_secs(30),
            max_retries: DEFAULT_MAX_RETRIES,
            auto_process: true,
        }
    }
}

/// Counts from one [`QueueProcessor::process`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    pub dispatched: usize,
    pub completed: usize,
    pub rescheduled: usize,
    pub failed: usize,
}

/// Callback receiving a progress snapshot after every transition.
pub type ProgressObserver = Arc<dyn Fn(QueueProgress) + Send + Sync>;

enum Outcome {
    Done,
    NoHandler,
    Failed(HandlerError),
}

struct Inner {
    store: Arc<SyncItemStore>,
    config: ProcessorConfig,
    handlers: RwLock<HashMap<ItemType, Arc<dyn UploadHandler>>>,
    processing: AtomicBool,
    paused: AtomicBool,
    observer: Mutex<Option<ProgressObserver>>,
    retry_timer: Mutex<Option<JoinHandle<()>>>,
}

/// Scheduler over the durable sync queue. Cheap to clone.
#[derive(Clone)]
pub struct QueueProcessor {
    inner: Arc<Inner>,
}

impl QueueProcessor {
    pub fn new(store: Arc<SyncItemStore>, config: ProcessorConfig) -> Self {
        let concurrency = config.concurrency.max(1);
        QueueProcessor {
            inner: Arc::new(Inner {
                store,
                config: ProcessorConfig {
                    concurrency,
                    ..config
                },
                handlers: RwLock::new(HashMap::new()),
                processing: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                observer: Mutex::new(None),
                retry_timer: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &Arc<SyncItemStore> {
        &self.inner.store
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.inner.config
    }

    /// Registers the handler for `item_type`, replacing any previous one.
    pub fn register_handler(&self, item_type: ItemType, handler: Arc<dyn UploadHandler>) {
        let mut handlers = self
            .inner
            .handlers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        if handlers.insert(item_type, handler).is_some() {
            tracing::debug!("replaced handler for {}", item_type);
        }
    }

    pub fn set_observer(&self, observer: ProgressObserver) {
        *self
            .inner
            .observer
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(observer);
    }

    pub fn is_processing(&self) -> bool {
        self.inner.processing.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Persists a new item, then wakes the processor.
    ///
    /// Items without an explicit retry ceiling get the configured one.
    pub fn enqueue(&self, mut new: NewSyncItem) -> ProcessResult<SyncItem> {
        if new.max_retries.is_none() {
            new.max_retries = Some(self.inner.config.max_retries);
        }
        let item = self.inner.store.create(new)?;
        tracing::debug!(
            "enqueued {} ({} {}, priority {})",
            item.id,
            item.item_type,
            item.item_id,
            item.priority
        );
        self.notify();
        self.wake();
        Ok(item)
    }

    /// Starts a background processing run if auto-processing is enabled, the
    /// queue is not paused, and a tokio runtime is available.
    pub fn wake(&self) {
        if !self.inner.config.auto_process || self.is_paused() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime available, skipping wake-up");
            return;
        };
        let this = self.clone();
        runtime.spawn(async move {
            if let Err(e) = this.process().await {
                tracing::error!("queue processing aborted: {}", e);
            }
        });
    }

    /// Runs the processing loop inline until nothing is ready.
    ///
    /// Returns immediately with an empty summary when paused or when another
    /// run is active; that run will pick up whatever is ready.
    pub async fn process(&self) -> ProcessResult<ProcessSummary> {
        let mut summary = ProcessSummary::default();
        loop {
            if self.is_paused() {
                break;
            }
            if self
                .inner
                .processing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                break;
            }
            let result = self.drain(&mut summary).await;
            self.inner.processing.store(false, Ordering::SeqCst);
            result?;

            // An enqueue that raced with the flag reset found us busy and
            // returned; pick its item up here.
            if self.is_paused() || !self.inner.store.has_ready()? {
                break;
            }
        }
        if summary.dispatched > 0 {
            tracing::info!(
                "queue drained: {} dispatched, {} completed, {} rescheduled, {} failed",
                summary.dispatched,
                summary.completed,
                summary.rescheduled,
                summary.failed
            );
        }
        self.arm_retry_timer()?;
        Ok(summary)
    }

    async fn drain(&self, summary: &mut ProcessSummary) -> ProcessResult<()> {
        loop {
            if self.is_paused() {
                tracing::info!("queue paused, stopping dispatch");
                return Ok(());
            }
            let ready = self
                .inner
                .store
                .find_ready_to_sync(Some(self.inner.config.concurrency))?;
            if ready.is_empty() {
                return Ok(());
            }

            let mut batch = Vec::with_capacity(ready.len());
            for mut item in ready {
                match self.inner.store.mark_in_progress(&item.id) {
                    Ok(true) => {
                        item.status = ItemStatus::InProgress;
                        batch.push(item);
                    }
                    Ok(false) | Err(fieldsync_core::Error::ItemNotFound(_)) => {}
                    Err(e) => {
                        self.release_claims(&batch);
                        return Err(e.into());
                    }
                }
            }
            if batch.is_empty() {
                continue;
            }
            summary.dispatched += batch.len();
            self.notify();

            // Each outcome is recorded on its own; one store failure must not
            // strand the rest of the batch in progress.
            let outcomes = join_all(batch.iter().map(|item| self.dispatch(item))).await;
            let mut first_error = None;
            for (item, outcome) in batch.iter().zip(outcomes) {
                if let Err(e) = self.resolve(item, outcome, summary) {
                    tracing::error!("failed to record outcome of {}: {}", item.id, e);
                    self.release_claims(std::slice::from_ref(item));
                    first_error.get_or_insert(e);
                }
                self.notify();
            }
            if let Some(e) = first_error {
                return Err(e);
            }
        }
    }

    /// Returns claimed items to pending. Best effort: failures are logged and
    /// `open` requeues anything still in progress on the next start.
    fn release_claims(&self, items: &[SyncItem]) {
        for item in items {
            match self.inner.store.release_claim(&item.id) {
                Ok(true) => tracing::debug!("released claim on {}", item.id),
                Ok(false) => {}
                Err(e) => tracing::warn!("could not release claim on {}: {}", item.id, e),
            }
        }
    }

    async fn dispatch(&self, item: &SyncItem) -> Outcome {
        let handler = self
            .inner
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&item.item_type)
            .cloned();
        let Some(handler) = handler else {
            return Outcome::NoHandler;
        };
        tracing::debug!(
            "dispatching {} ({}, attempt {})",
            item.id,
            item.item_type,
            item.retry_count + 1
        );
        match handler.handle(item).await {
            Ok(()) => Outcome::Done,
            Err(e) => Outcome::Failed(e),
        }
    }

    fn resolve(
        &self,
        item: &SyncItem,
        outcome: Outcome,
        summary: &mut ProcessSummary,
    ) -> ProcessResult<()> {
        let store = &self.inner.store;
        match outcome {
            Outcome::Done => {
                store.mark_completed(&item.id)?;
                summary.completed += 1;
                tracing::debug!("completed {}", item.id);
            }
            Outcome::NoHandler => {
                store.mark_exhausted(&item.id, NO_HANDLER_MESSAGE)?;
                summary.failed += 1;
                tracing::error!("{}: {} for {}", item.id, NO_HANDLER_MESSAGE, item.item_type);
            }
            Outcome::Failed(e) if !e.is_retryable() => {
                store.mark_exhausted(&item.id, &e.to_string())?;
                summary.failed += 1;
                tracing::error!("{} failed permanently: {}", item.id, e);
            }
            Outcome::Failed(e) => {
                let delay_ms = i64::try_from(self.inner.config.retry_delay.as_millis())
                    .unwrap_or(i64::MAX);
                let updated = store.mark_failed(&item.id, &e.to_string(), delay_ms)?;
                if updated.status == ItemStatus::Failed {
                    summary.failed += 1;
                    tracing::error!(
                        "{} failed after {} attempts: {}",
                        item.id,
                        updated.retry_count,
                        e
                    );
                } else {
                    summary.rescheduled += 1;
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {}s: {}",
                        item.id,
                        updated.retry_count,
                        updated.max_retries,
                        self.inner.config.retry_delay.as_secs(),
                        e
                    );
                }
            }
        }
        Ok(())
    }

    /// Schedules a wake-up for the earliest pending retry, replacing any
    /// previously armed timer.
    fn arm_retry_timer(&self) -> ProcessResult<()> {
        if !self.inner.config.auto_process {
            return Ok(());
        }
        let Some(due) = self.inner.store.next_retry_due()? else {
            return Ok(());
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return Ok(());
        };
        let remaining = due - self.inner.store.now_ms();
        let wait = Duration::from_millis(u64::try_from(remaining).unwrap_or(0));
        let this = self.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(wait).await;
            this.wake();
        });
        let mut timer = self
            .inner
            .retry_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
        tracing::debug!("next retry due in {}ms", wait.as_millis());
        Ok(())
    }

    /// Cooperative pause: in-flight handlers finish, nothing new starts.
    pub fn pause(&self) {
        if !self.inner.paused.swap(true, Ordering::SeqCst) {
            tracing::info!("queue paused");
        }
    }

    pub fn resume(&self) {
        if self.inner.paused.swap(false, Ordering::SeqCst) {
            tracing::info!("queue resumed");
        }
        self.wake();
    }

    /// Returns every failed item to `pending` with a fresh retry budget.
    pub fn retry_failed(&self) -> ProcessResult<usize> {
        let count = self.inner.store.reset_failed()?;
        if count > 0 {
            tracing::info!("requeued {} failed items", count);
            self.notify();
            self.wake();
        }
        Ok(count)
    }

    pub fn statistics(&self) -> ProcessResult<QueueStats> {
        Ok(self.inner.store.get_statistics()?)
    }

    pub fn progress(&self) -> ProcessResult<QueueProgress> {
        Ok(self.statistics()?.into())
    }

    /// Cancels the pending retry timer. In-flight runs are not interrupted.
    pub fn shutdown(&self) {
        let timer = self
            .inner
            .retry_timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = timer {
            handle.abort();
        }
    }

    fn notify(&self) {
        let observer = self
            .inner
            .observer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let Some(observer) = observer else {
            return;
        };
        match self.progress() {
            Ok(progress) => observer(progress),
            Err(e) => tracing::warn!("failed to compute queue progress: {}", e),
        }
    }
}
