// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Local record repositories consumed by the coordinator and handlers.

use std::sync::Arc;

use fieldsync_core::{
    AudioRecording, LocalDatabase, RecordingSession, SensorDataRecord, StoredRecord,
};
use futures_util::future::BoxFuture;

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("local database error: {0}")]
    Database(#[from] fieldsync_core::Error),

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Access to one kind of locally captured record.
pub trait RecordRepository<R>: Send + Sync {
    /// Records whose `is_uploaded` flag is not yet set.
    fn find_unuploaded(&self) -> BoxFuture<'_, RepositoryResult<Vec<R>>>;

    /// Records with the given ids. Unknown ids are omitted.
    fn find_by_ids(&self, ids: Vec<String>) -> BoxFuture<'_, RepositoryResult<Vec<R>>>;

    fn mark_as_uploaded(&self, ids: Vec<String>) -> BoxFuture<'_, RepositoryResult<()>>;
}

/// Repository backed by the SQLite [`LocalDatabase`].
#[derive(Clone)]
pub struct LocalRepository {
    db: Arc<LocalDatabase>,
}

impl LocalRepository {
    pub fn new(db: Arc<LocalDatabase>) -> Self {
        LocalRepository { db }
    }
}

impl<R: StoredRecord> RecordRepository<R> for LocalRepository {
    fn find_unuploaded(&self) -> BoxFuture<'_, RepositoryResult<Vec<R>>> {
        Box::pin(async move { Ok(self.db.find_unuploaded::<R>()?) })
    }

    fn find_by_ids(&self, ids: Vec<String>) -> BoxFuture<'_, RepositoryResult<Vec<R>>> {
        Box::pin(async move { Ok(self.db.find_by_ids::<R>(&ids)?) })
    }

    fn mark_as_uploaded(&self, ids: Vec<String>) -> BoxFuture<'_, RepositoryResult<()>> {
        Box::pin(async move {
            self.db.mark_as_uploaded::<R>(&ids)?;
            Ok(())
        })
    }
}

/// The three record repositories the sync engine reconciles.
#[derive(Clone)]
pub struct Repositories {
    pub sessions: Arc<dyn RecordRepository<RecordingSession>>,
    pub sensor_data: Arc<dyn RecordRepository<SensorDataRecord>>,
    pub audio: Arc<dyn RecordRepository<AudioRecording>>,
}

impl Repositories {
    /// All three repositories over one local database.
    pub fn local(db: Arc<LocalDatabase>) -> Self {
        let repo = LocalRepository::new(db);
        Repositories {
            sessions: Arc::new(repo.clone()),
            sensor_data: Arc::new(repo.clone()),
            audio: Arc::new(repo),
        }
    }
}
