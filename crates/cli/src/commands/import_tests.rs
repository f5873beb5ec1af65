// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::fs;

use fieldsync_core::{RecordingSession, SensorDataRecord};
use tempfile::TempDir;

use super::*;

const RECORDS: &str = r#"{"kind":"session","id":"s1","session_id":"s1","start_time":1700000000000}
{"kind":"sensor_data","id":"d1","session_id":"s1","sensor_type":"gps","timestamp":1,"latitude":52.1}

{"kind":"sensor_data","id":"d2","session_id":"s1","sensor_type":"gps","timestamp":2,"latitude":52.2}
{"kind":"audio","id":"a1","session_id":"s1","timestamp":3,"file_path":"/rec/a1.m4a"}
"#;

fn write_file(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("records.jsonl");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn import_counts_by_kind() {
    let dir = TempDir::new().unwrap();
    let local = LocalDatabase::open_in_memory().unwrap();

    let summary = import_file(&local, &write_file(&dir, RECORDS)).unwrap();

    assert_eq!(
        summary,
        ImportSummary {
            sessions: 1,
            sensor_data: 2,
            audio: 1,
        }
    );
    assert_eq!(summary.total(), 4);
    let counts = local.pending_counts().unwrap();
    assert_eq!(
        (counts.sessions, counts.sensor_data, counts.audio_files),
        (1, 2, 1)
    );
}

#[test]
fn reimport_replaces_records() {
    let dir = TempDir::new().unwrap();
    let local = LocalDatabase::open_in_memory().unwrap();
    let path = write_file(&dir, RECORDS);

    import_file(&local, &path).unwrap();
    import_file(&local, &path).unwrap();

    assert_eq!(local.count_unuploaded::<SensorDataRecord>().unwrap(), 2);
    assert_eq!(local.count_unuploaded::<RecordingSession>().unwrap(), 1);
}

#[test]
fn malformed_line_imports_nothing() {
    let dir = TempDir::new().unwrap();
    let local = LocalDatabase::open_in_memory().unwrap();
    let content = format!("{RECORDS}{{\"kind\":\"session\",\"id\":\n");

    let err = import_file(&local, &write_file(&dir, &content)).unwrap_err();

    assert!(err.to_string().contains("line 6"), "{err}");
    assert_eq!(local.count_unuploaded::<RecordingSession>().unwrap(), 0);
}

#[test]
fn unknown_kind_is_rejected() {
    let dir = TempDir::new().unwrap();
    let local = LocalDatabase::open_in_memory().unwrap();
    let content = r#"{"kind":"video","id":"v1","session_id":"s1"}"#;

    assert!(import_file(&local, &write_file(&dir, content)).is_err());
}

#[test]
fn missing_file_is_an_error() {
    let local = LocalDatabase::open_in_memory().unwrap();
    assert!(import_file(&local, Path::new("/nonexistent/records.jsonl")).is_err());
}
