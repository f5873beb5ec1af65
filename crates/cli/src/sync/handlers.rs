// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Type-specific upload handlers.
//!
//! A handler loads the records a [`SyncItem`] references, transfers them
//! through the [`HttpClient`], and flags them uploaded on success. Handlers
//! never decide about retries; they only classify their failure through
//! [`HandlerError::is_retryable`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use fieldsync_core::{AudioRecording, ItemType, RecordingSession, SensorDataRecord, SyncItem};
use futures_util::future::BoxFuture;
use serde_json::{json, Value};

use super::processor::QueueProcessor;
use super::repository::{RecordRepository, Repositories, RepositoryError};
use super::transport::{ApiError, HttpClient, UploadForm};

const AUDIO_MIME_TYPE: &str = "audio/m4a";

/// Why a handler could not complete an item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("repository error: {0}")]
    Repository(String),

    #[error("missing resource: {0}")]
    MissingResource(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl HandlerError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, HandlerError::Api(_) | HandlerError::Repository(_))
    }
}

impl From<RepositoryError> for HandlerError {
    fn from(e: RepositoryError) -> Self {
        HandlerError::Repository(e.to_string())
    }
}

/// Result type for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Transfers one kind of sync item.
pub trait UploadHandler: Send + Sync {
    fn handle<'a>(&'a self, item: &'a SyncItem) -> BoxFuture<'a, HandlerResult<()>>;
}

/// File-existence check used before audio uploads.
pub trait FileProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileProbe`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

fn referenced_ids(item: &SyncItem) -> HandlerResult<Vec<String>> {
    let ids = item.record_ids();
    if ids.is_empty() {
        return Err(HandlerError::InvalidPayload(format!(
            "item {} references no records",
            item.id
        )));
    }
    Ok(ids)
}

/// Loads the single record an item references.
async fn load_one<R>(
    repo: &dyn RecordRepository<R>,
    item: &SyncItem,
    id_of: impl Fn(&R) -> &str,
    kind: &str,
) -> HandlerResult<R> {
    let ids = referenced_ids(item)?;
    let wanted = &ids[0];
    repo.find_by_ids(vec![wanted.clone()])
        .await?
        .into_iter()
        .find(|r| id_of(r) == wanted.as_str())
        .ok_or_else(|| HandlerError::MissingResource(format!("{kind} {wanted} not found")))
}

/// Uploads session metadata: `POST /sessions`.
pub struct SessionUploadHandler {
    client: Arc<dyn HttpClient>,
    sessions: Arc<dyn RecordRepository<RecordingSession>>,
}

impl SessionUploadHandler {
    pub fn new(
        client: Arc<dyn HttpClient>,
        sessions: Arc<dyn RecordRepository<RecordingSession>>,
    ) -> Self {
        SessionUploadHandler { client, sessions }
    }
}

pub(crate) fn session_payload(session: &RecordingSession) -> Value {
    json!({
        "sessionId": session.session_id,
        "startTime": session.start_time,
        "endTime": session.end_time,
        "enabledSensors": session.enabled_sensors,
        "sampleRate": session.sample_rate,
        "notes": session.notes,
        "isActive": session.is_active,
    })
}

impl UploadHandler for SessionUploadHandler {
    fn handle<'a>(&'a self, item: &'a SyncItem) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(async move {
            let session =
                load_one(self.sessions.as_ref(), item, |s| s.id.as_str(), "session").await?;
            self.client
                .post("/sessions", session_payload(&session), Some(item.id.as_str()))
                .await?;
            self.sessions.mark_as_uploaded(vec![session.id]).await?;
            Ok(())
        })
    }
}

/// Uploads a batch of sensor samples: `POST /sessions/{id}/sensor-data`.
pub struct SensorDataUploadHandler {
    client: Arc<dyn HttpClient>,
    sensor_data: Arc<dyn RecordRepository<SensorDataRecord>>,
}

impl SensorDataUploadHandler {
    pub fn new(
        client: Arc<dyn HttpClient>,
        sensor_data: Arc<dyn RecordRepository<SensorDataRecord>>,
    ) -> Self {
        SensorDataUploadHandler {
            client,
            sensor_data,
        }
    }
}

pub(crate) fn sensor_payload(records: &[SensorDataRecord]) -> Value {
    let data: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "timestamp": r.timestamp,
                "sensorType": r.sensor_type,
                "x": r.x,
                "y": r.y,
                "z": r.z,
                "latitude": r.latitude,
                "longitude": r.longitude,
                "altitude": r.altitude,
                "accuracy": r.accuracy,
                "speed": r.speed,
                "heading": r.heading,
            })
        })
        .collect();
    json!({ "data": data })
}

impl UploadHandler for SensorDataUploadHandler {
    fn handle<'a>(&'a self, item: &'a SyncItem) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(async move {
            let ids = referenced_ids(item)?;
            let records = self.sensor_data.find_by_ids(ids.clone()).await?;
            if records.is_empty() {
                return Err(HandlerError::MissingResource(format!(
                    "none of the {} sensor records in {} exist",
                    ids.len(),
                    item.id
                )));
            }
            if records.len() < ids.len() {
                let found: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
                let missing: Vec<&str> = ids
                    .iter()
                    .map(String::as_str)
                    .filter(|id| !found.contains(id))
                    .collect();
                tracing::warn!(
                    "item {}: {} sensor records no longer exist: {}",
                    item.id,
                    missing.len(),
                    missing.join(", ")
                );
            }

            let path = format!("/sessions/{}/sensor-data", item.session_id);
            self.client
                .post(&path, sensor_payload(&records), Some(item.id.as_str()))
                .await?;

            let uploaded = records.into_iter().map(|r| r.id).collect();
            self.sensor_data.mark_as_uploaded(uploaded).await?;
            Ok(())
        })
    }
}

/// Uploads an audio file: multipart `POST /sessions/{id}/audio`.
pub struct AudioUploadHandler {
    client: Arc<dyn HttpClient>,
    audio: Arc<dyn RecordRepository<AudioRecording>>,
    files: Arc<dyn FileProbe>,
}

impl AudioUploadHandler {
    pub fn new(
        client: Arc<dyn HttpClient>,
        audio: Arc<dyn RecordRepository<AudioRecording>>,
        files: Arc<dyn FileProbe>,
    ) -> Self {
        AudioUploadHandler {
            client,
            audio,
            files,
        }
    }
}

pub(crate) fn audio_form(recording: &AudioRecording) -> UploadForm {
    UploadForm::new(&recording.file_path, AUDIO_MIME_TYPE)
        .field("sessionId", &recording.session_id)
        .field("timestamp", recording.timestamp)
        .field("duration", recording.duration)
        .field("sampleRate", recording.sample_rate)
        .field("channels", recording.channels)
        .field("format", &recording.format)
}

impl UploadHandler for AudioUploadHandler {
    fn handle<'a>(&'a self, item: &'a SyncItem) -> BoxFuture<'a, HandlerResult<()>> {
        Box::pin(async move {
            let recording =
                load_one(self.audio.as_ref(), item, |a| a.id.as_str(), "audio recording").await?;
            if !self.files.exists(Path::new(&recording.file_path)) {
                return Err(HandlerError::MissingResource(format!(
                    "audio file not found: {}",
                    recording.file_path
                )));
            }

            let path = format!("/sessions/{}/audio", recording.session_id);
            self.client
                .upload_file(&path, audio_form(&recording), Some(item.id.as_str()))
                .await?;
            self.audio.mark_as_uploaded(vec![recording.id]).await?;
            Ok(())
        })
    }
}

/// Registers the session, sensor-data and audio handlers on `processor`.
pub fn register_upload_handlers(
    processor: &QueueProcessor,
    client: Arc<dyn HttpClient>,
    repos: &Repositories,
    files: Arc<dyn FileProbe>,
) {
    processor.register_handler(
        ItemType::Session,
        Arc::new(SessionUploadHandler::new(client.clone(), repos.sessions.clone())),
    );
    processor.register_handler(
        ItemType::SensorData,
        Arc::new(SensorDataUploadHandler::new(
            client.clone(),
            repos.sensor_data.clone(),
        )),
    );
    processor.register_handler(
        ItemType::Audio,
        Arc::new(AudioUploadHandler::new(client, repos.audio.clone(), files)),
    );
}
