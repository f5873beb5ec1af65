// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldsync_core::{
    AudioRecording, LocalDatabase, ManualClock, RecordingSession, SensorDataRecord, SyncItem,
    SyncItemStore,
};
use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use super::handlers::{FileProbe, HandlerError, HandlerResult, UploadHandler};
use super::processor::{ProcessorConfig, QueueProcessor};
use super::repository::{RecordRepository, RepositoryError, RepositoryResult};
use super::transport::{ApiError, ApiResult, HttpClient, UploadForm};

/// A request seen by [`MockHttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Post {
        path: String,
        body: Value,
        key: Option<String>,
    },
    Upload {
        path: String,
        form: UploadForm,
        key: Option<String>,
    },
}

impl Call {
    pub fn path(&self) -> &str {
        match self {
            Call::Get(path) => path,
            Call::Post { path, .. } | Call::Upload { path, .. } => path,
        }
    }
}

/// HTTP client that records calls and replays scripted responses.
pub struct MockHttpClient {
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<ApiResult<Value>>>,
    fallback: Mutex<ApiResult<Value>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        MockHttpClient {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(json!({}))),
        }
    }

    /// A client whose every call fails with `error`.
    pub fn failing(error: ApiError) -> Self {
        let client = Self::new();
        *client.fallback.lock().unwrap() = Err(error);
        client
    }

    /// Queues a response for the next call.
    pub fn push_response(&self, response: ApiResult<Value>) {
        self.script.lock().unwrap().push_back(response);
    }

    pub fn set_fallback(&self, response: ApiResult<Value>) {
        *self.fallback.lock().unwrap() = response;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, call: Call) -> ApiResult<Value> {
        self.calls.lock().unwrap().push(call);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }
}

impl HttpClient for MockHttpClient {
    fn get(&self, path: &str) -> BoxFuture<'_, ApiResult<Value>> {
        let result = self.respond(Call::Get(path.to_string()));
        Box::pin(async move { result })
    }

    fn post(
        &self,
        path: &str,
        body: Value,
        idempotency_key: Option<&str>,
    ) -> BoxFuture<'_, ApiResult<Value>> {
        let result = self.respond(Call::Post {
            path: path.to_string(),
            body,
            key: idempotency_key.map(str::to_string),
        });
        Box::pin(async move { result })
    }

    fn upload_file(
        &self,
        path: &str,
        form: UploadForm,
        idempotency_key: Option<&str>,
    ) -> BoxFuture<'_, ApiResult<Value>> {
        let result = self.respond(Call::Upload {
            path: path.to_string(),
            form,
            key: idempotency_key.map(str::to_string),
        });
        Box::pin(async move { result })
    }
}

/// Repository whose every operation fails.
pub struct FailingRepository;

impl<R: Send + 'static> RecordRepository<R> for FailingRepository {
    fn find_unuploaded(&self) -> BoxFuture<'_, RepositoryResult<Vec<R>>> {
        Box::pin(async { Err(RepositoryError::Unavailable("disk detached".into())) })
    }

    fn find_by_ids(&self, _ids: Vec<String>) -> BoxFuture<'_, RepositoryResult<Vec<R>>> {
        Box::pin(async { Err(RepositoryError::Unavailable("disk detached".into())) })
    }

    fn mark_as_uploaded(&self, _ids: Vec<String>) -> BoxFuture<'_, RepositoryResult<()>> {
        Box::pin(async { Err(RepositoryError::Unavailable("disk detached".into())) })
    }
}

/// File probe answering from a fixed set of paths.
#[derive(Default)]
pub struct StaticProbe {
    present: Vec<PathBuf>,
}

impl StaticProbe {
    pub fn with(paths: &[&str]) -> Self {
        StaticProbe {
            present: paths.iter().map(PathBuf::from).collect(),
        }
    }
}

impl FileProbe for StaticProbe {
    fn exists(&self, path: &Path) -> bool {
        self.present.iter().any(|p| p == path)
    }
}

/// Handler that fails a set number of times before succeeding, recording
/// dispatch order and peak concurrency.
pub struct ScriptedHandler {
    failures_left: AtomicU32,
    error: HandlerError,
    delay: Duration,
    seen: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    gate: Option<Arc<tokio::sync::Notify>>,
    entered: AtomicBool,
}

impl ScriptedHandler {
    pub fn succeeding() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(times: u32) -> Self {
        ScriptedHandler {
            failures_left: AtomicU32::new(times),
            error: HandlerError::Api(ApiError::http(503, "Service Unavailable")),
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            gate: None,
            entered: AtomicBool::new(false),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    pub fn with_error(mut self, error: HandlerError) -> Self {
        self.error = error;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Blocks every call until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<tokio::sync::Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }
}

impl UploadHandler for ScriptedHandler {
    fn handle<'a>(&'a self, item: &'a SyncItem) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(async move {
            self.entered.store(true, Ordering::SeqCst);
            self.seen.lock().unwrap().push(item.item_id.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let fail = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if fail {
                Err(self.error.clone())
            } else {
                Ok(())
            }
        })
    }
}

/// Store on a manual clock, starting at `start_ms`.
pub fn manual_store(start_ms: i64) -> (Arc<SyncItemStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_ms));
    let store = SyncItemStore::open_in_memory()
        .unwrap()
        .with_clock(clock.clone());
    (Arc::new(store), clock)
}

/// A processor that only runs when `process()` is called.
pub fn manual_processor(store: Arc<SyncItemStore>, concurrency: usize) -> QueueProcessor {
    QueueProcessor::new(
        store,
        ProcessorConfig {
            concurrency,
            retry_delay: Duration::from_secs(30),
            max_retries: 3,
            auto_process: false,
        },
    )
}

pub fn make_session(id: &str) -> RecordingSession {
    RecordingSession {
        id: id.to_string(),
        session_id: id.to_string(),
        start_time: 1_700_000_000_000,
        end_time: Some(1_700_000_600_000),
        is_active: false,
        enabled_sensors: vec!["accelerometer".into(), "gps".into()],
        sample_rate: 50,
        data_count: 0,
        notes: None,
        is_uploaded: false,
    }
}

pub fn make_sample(id: &str, session_id: &str, timestamp: i64) -> SensorDataRecord {
    SensorDataRecord {
        id: id.to_string(),
        session_id: session_id.to_string(),
        sensor_type: "accelerometer".into(),
        timestamp,
        x: Some(0.1),
        y: Some(-9.8),
        z: Some(0.3),
        latitude: None,
        longitude: None,
        altitude: None,
        accuracy: None,
        speed: None,
        heading: None,
        is_uploaded: false,
    }
}

pub fn make_audio(id: &str, session_id: &str, file_path: &str) -> AudioRecording {
    AudioRecording {
        id: id.to_string(),
        session_id: session_id.to_string(),
        timestamp: 1_700_000_100_000,
        file_path: file_path.to_string(),
        file_size: 2048,
        duration: 4.5,
        sample_rate: 44_100,
        channels: 1,
        format: "m4a".into(),
        is_uploaded: false,
        uploaded_url: None,
    }
}

/// An in-memory local database seeded with `sessions` sessions and
/// `samples` sensor samples for session `s1`.
pub fn seeded_local(sessions: usize, samples: usize) -> Arc<LocalDatabase> {
    let db = LocalDatabase::open_in_memory().unwrap();
    for i in 0..sessions {
        db.insert(&make_session(&format!("s{}", i + 1))).unwrap();
    }
    for i in 0..samples {
        db.insert(&make_sample(&format!("d{i:04}"), "s1", i as i64))
            .unwrap();
    }
    Arc::new(db)
}
