// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed local record database.
//!
//! Stands in for the app's own database: sessions, sensor samples and audio
//! recordings, each with an `is_uploaded` flag. Access is generic over
//! [`StoredRecord`] so every record kind shares the same query surface.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, Row};

use crate::error::Result;
use crate::item::validate_record_id;
use crate::records::{AudioRecording, LocalRecord, RecordingSession, SensorDataRecord};

/// SQL schema for local records.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS recording_sessions (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    start_time INTEGER NOT NULL,
    end_time INTEGER,
    is_active INTEGER NOT NULL DEFAULT 0,
    enabled_sensors TEXT NOT NULL DEFAULT '[]',
    sample_rate INTEGER NOT NULL DEFAULT 0,
    data_count INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    is_uploaded INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS sensor_data (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    sensor_type TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    x REAL,
    y REAL,
    z REAL,
    latitude REAL,
    longitude REAL,
    altitude REAL,
    accuracy REAL,
    speed REAL,
    heading REAL,
    is_uploaded INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS audio_recordings (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    file_path TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    duration REAL NOT NULL DEFAULT 0,
    sample_rate INTEGER NOT NULL DEFAULT 0,
    channels INTEGER NOT NULL DEFAULT 1,
    format TEXT NOT NULL DEFAULT 'm4a',
    is_uploaded INTEGER NOT NULL DEFAULT 0,
    uploaded_url TEXT
);

CREATE INDEX IF NOT EXISTS idx_sessions_uploaded ON recording_sessions(is_uploaded);
CREATE INDEX IF NOT EXISTS idx_sensor_data_uploaded ON sensor_data(is_uploaded, session_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_audio_uploaded ON audio_recordings(is_uploaded);
"#;

/// A record kind persisted in the local database.
pub trait StoredRecord: Sized + Send + Sync + 'static {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
    /// Ordering for unuploaded scans.
    const ORDER: &'static str;

    fn record_id(&self) -> &str;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn insert(&self, conn: &Connection) -> rusqlite::Result<()>;
}

impl StoredRecord for RecordingSession {
    const TABLE: &'static str = "recording_sessions";
    const COLUMNS: &'static str = "id, session_id, start_time, end_time, is_active, \
        enabled_sensors, sample_rate, data_count, notes, is_uploaded";
    const ORDER: &'static str = "start_time ASC, id ASC";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let sensors: String = row.get(5)?;
        let enabled_sensors = serde_json::from_str(&sensors).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(RecordingSession {
            id: row.get(0)?,
            session_id: row.get(1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            is_active: row.get(4)?,
            enabled_sensors,
            sample_rate: row.get(6)?,
            data_count: row.get::<_, i64>(7)? as u64,
            notes: row.get(8)?,
            is_uploaded: row.get(9)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        let sensors = serde_json::to_string(&self.enabled_sensors)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        conn.execute(
            "INSERT OR REPLACE INTO recording_sessions (id, session_id, start_time, end_time,
             is_active, enabled_sensors, sample_rate, data_count, notes, is_uploaded)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.id,
                self.session_id,
                self.start_time,
                self.end_time,
                self.is_active,
                sensors,
                self.sample_rate,
                self.data_count as i64,
                self.notes,
                self.is_uploaded,
            ],
        )?;
        Ok(())
    }
}

impl StoredRecord for SensorDataRecord {
    const TABLE: &'static str = "sensor_data";
    const COLUMNS: &'static str = "id, session_id, sensor_type, timestamp, x, y, z, \
        latitude, longitude, altitude, accuracy, speed, heading, is_uploaded";
    const ORDER: &'static str = "session_id ASC, timestamp ASC, id ASC";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(SensorDataRecord {
            id: row.get(0)?,
            session_id: row.get(1)?,
            sensor_type: row.get(2)?,
            timestamp: row.get(3)?,
            x: row.get(4)?,
            y: row.get(5)?,
            z: row.get(6)?,
            latitude: row.get(7)?,
            longitude: row.get(8)?,
            altitude: row.get(9)?,
            accuracy: row.get(10)?,
            speed: row.get(11)?,
            heading: row.get(12)?,
            is_uploaded: row.get(13)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO sensor_data (id, session_id, sensor_type, timestamp,
             x, y, z, latitude, longitude, altitude, accuracy, speed, heading, is_uploaded)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                self.id,
                self.session_id,
                self.sensor_type,
                self.timestamp,
                self.x,
                self.y,
                self.z,
                self.latitude,
                self.longitude,
                self.altitude,
                self.accuracy,
                self.speed,
                self.heading,
                self.is_uploaded,
            ],
        )?;
        Ok(())
    }
}

impl StoredRecord for AudioRecording {
    const TABLE: &'static str = "audio_recordings";
    const COLUMNS: &'static str = "id, session_id, timestamp, file_path, file_size, \
        duration, sample_rate, channels, format, is_uploaded, uploaded_url";
    const ORDER: &'static str = "timestamp ASC, id ASC";

    fn record_id(&self) -> &str {
        &self.id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(AudioRecording {
            id: row.get(0)?,
            session_id: row.get(1)?,
            timestamp: row.get(2)?,
            file_path: row.get(3)?,
            file_size: row.get::<_, i64>(4)? as u64,
            duration: row.get(5)?,
            sample_rate: row.get(6)?,
            channels: row.get(7)?,
            format: row.get(8)?,
            is_uploaded: row.get(9)?,
            uploaded_url: row.get(10)?,
        })
    }

    fn insert(&self, conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO audio_recordings (id, session_id, timestamp, file_path,
             file_size, duration, sample_rate, channels, format, is_uploaded, uploaded_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                self.id,
                self.session_id,
                self.timestamp,
                self.file_path,
                self.file_size as i64,
                self.duration,
                self.sample_rate,
                self.channels,
                self.format,
                self.is_uploaded,
                self.uploaded_url,
            ],
        )?;
        Ok(())
    }
}

/// Counts of records still waiting for upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounts {
    pub sessions: usize,
    pub sensor_data: usize,
    pub audio_files: usize,
}

/// Id filter bound as a single JSON array parameter, so batch size is not
/// limited by SQLite's host parameter ceiling.
const ID_IN_JSON: &str = "id IN (SELECT value FROM json_each(?1))";

/// Local record database.
pub struct LocalDatabase {
    conn: Mutex<Connection>,
}

impl LocalDatabase {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(LocalDatabase {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(LocalDatabase {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn insert<R: StoredRecord>(&self, record: &R) -> Result<()> {
        validate_record_id(record.record_id())?;
        record.insert(&self.conn())?;
        Ok(())
    }

    /// Inserts a batch of imported records in one transaction.
    ///
    /// Nothing is written if any record id is rejected.
    pub fn import(&self, records: &[LocalRecord]) -> Result<usize> {
        for record in records {
            validate_record_id(record.id())?;
        }
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for record in records {
            match record {
                LocalRecord::Session(r) => r.insert(&tx)?,
                LocalRecord::SensorData(r) => r.insert(&tx)?,
                LocalRecord::Audio(r) => r.insert(&tx)?,
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn find_unuploaded<R: StoredRecord>(&self) -> Result<Vec<R>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE is_uploaded = 0 ORDER BY {}",
            R::COLUMNS,
            R::TABLE,
            R::ORDER
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| R::from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Loads the records with the given ids. Unknown ids are omitted.
    pub fn find_by_ids<R: StoredRecord>(&self, ids: &[String]) -> Result<Vec<R>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM {} WHERE {ID_IN_JSON} ORDER BY {}",
            R::COLUMNS,
            R::TABLE,
            R::ORDER
        );
        let ids = serde_json::to_string(ids)?;
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![ids], |row| R::from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Flags the given records uploaded. Returns the number of rows changed.
    pub fn mark_as_uploaded<R: StoredRecord>(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE {} SET is_uploaded = 1 WHERE is_uploaded = 0 AND {ID_IN_JSON}",
            R::TABLE
        );
        let ids = serde_json::to_string(ids)?;
        let changed = self.conn().execute(&sql, params![ids])?;
        Ok(changed)
    }

    pub fn count_unuploaded<R: StoredRecord>(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE is_uploaded = 0", R::TABLE);
        let count: i64 = self.conn().query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn pending_counts(&self) -> Result<PendingCounts> {
        Ok(PendingCounts {
            sessions: self.count_unuploaded::<RecordingSession>()?,
            sensor_data: self.count_unuploaded::<SensorDataRecord>()?,
            audio_files: self.count_unuploaded::<AudioRecording>()?,
        })
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
