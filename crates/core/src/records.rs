// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locally captured records awaiting upload.
//!
//! These are the app-side entities the sync engine reconciles. Capture is out
//! of scope; records arrive through [`crate::LocalDatabase`] or a JSONL import.

use serde::{Deserialize, Serialize};

/// A recording session with its capture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSession {
    pub id: String,
    pub session_id: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub enabled_sensors: Vec<String>,
    #[serde(default)]
    pub sample_rate: u32,
    #[serde(default)]
    pub data_count: u64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_uploaded: bool,
}

/// A single sensor sample. Motion sensors fill `x/y/z`, GPS fills the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDataRecord {
    pub id: String,
    pub session_id: String,
    pub sensor_type: String,
    pub timestamp: i64,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub z: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub is_uploaded: bool,
}

/// An audio file recorded during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRecording {
    pub id: String,
    pub session_id: String,
    pub timestamp: i64,
    pub file_path: String,
    #[serde(default)]
    pub file_size: u64,
    /// Seconds.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub is_uploaded: bool,
    #[serde(default)]
    pub uploaded_url: Option<String>,
}

fn default_channels() -> u16 {
    1
}

fn default_format() -> String {
    "m4a".to_string()
}

/// One line of a record import file, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocalRecord {
    Session(RecordingSession),
    SensorData(SensorDataRecord),
    Audio(AudioRecording),
}

impl LocalRecord {
    pub fn id(&self) -> &str {
        match self {
            LocalRecord::Session(r) => &r.id,
            LocalRecord::SensorData(r) => &r.id,
            LocalRecord::Audio(r) => &r.id,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            LocalRecord::Session(r) => &r.session_id,
            LocalRecord::SensorData(r) => &r.session_id,
            LocalRecord::Audio(r) => &r.session_id,
        }
    }
}
