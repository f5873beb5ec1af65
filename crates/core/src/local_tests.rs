// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn session(id: &str, start_time: i64) -> RecordingSession {
    RecordingSession {
        id: id.to_string(),
        session_id: id.to_string(),
        start_time,
        end_time: Some(start_time + 60_000),
        is_active: false,
        enabled_sensors: vec!["accelerometer".into(), "gps".into()],
        sample_rate: 50,
        data_count: 3,
        notes: Some("field test".into()),
        is_uploaded: false,
    }
}

fn sample(id: &str, session_id: &str, timestamp: i64) -> SensorDataRecord {
    SensorDataRecord {
        id: id.to_string(),
        session_id: session_id.to_string(),
        sensor_type: "gps".into(),
        timestamp,
        x: None,
        y: None,
        z: None,
        latitude: Some(52.5),
        longitude: Some(13.4),
        altitude: None,
        accuracy: Some(4.0),
        speed: None,
        heading: None,
        is_uploaded: false,
    }
}

fn audio(id: &str) -> AudioRecording {
    AudioRecording {
        id: id.to_string(),
        session_id: "s1".into(),
        timestamp: 10,
        file_path: format!("/data/{id}.m4a"),
        file_size: 4096,
        duration: 12.5,
        sample_rate: 44_100,
        channels: 2,
        format: "m4a".into(),
        is_uploaded: false,
        uploaded_url: None,
    }
}

#[test]
fn session_fields_survive_storage() {
    let db = LocalDatabase::open_in_memory().unwrap();
    let s = session("s1", 1_000);
    db.insert(&s).unwrap();

    let found: Vec<RecordingSession> = db.find_unuploaded().unwrap();
    assert_eq!(found, vec![s]);
}

#[test]
fn audio_fields_survive_storage() {
    let db = LocalDatabase::open_in_memory().unwrap();
    let a = audio("a1");
    db.insert(&a).unwrap();

    let found: Vec<AudioRecording> = db.find_by_ids(&["a1".to_string()]).unwrap();
    assert_eq!(found, vec![a]);
}

#[test]
fn unuploaded_sensor_data_grouped_by_session_then_time() {
    let db = LocalDatabase::open_in_memory().unwrap();
    db.insert(&sample("d3", "s2", 5)).unwrap();
    db.insert(&sample("d2", "s1", 9)).unwrap();
    db.insert(&sample("d1", "s1", 1)).unwrap();

    let found: Vec<SensorDataRecord> = db.find_unuploaded().unwrap();
    let ids: Vec<&str> = found.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "d2", "d3"]);
}

#[test]
fn mark_as_uploaded_hides_records() {
    let db = LocalDatabase::open_in_memory().unwrap();
    for i in 0..4 {
        db.insert(&sample(&format!("d{i}"), "s1", i)).unwrap();
    }

    let changed = db
        .mark_as_uploaded::<SensorDataRecord>(&["d0".into(), "d2".into(), "missing".into()])
        .unwrap();
    assert_eq!(changed, 2);

    let again = db
        .mark_as_uploaded::<SensorDataRecord>(&["d0".into()])
        .unwrap();
    assert_eq!(again, 0);

    let remaining: Vec<SensorDataRecord> = db.find_unuploaded().unwrap();
    assert_eq!(remaining.len(), 2);
    assert_eq!(db.count_unuploaded::<SensorDataRecord>().unwrap(), 2);
}

#[test]
fn find_by_ids_omits_unknown_and_handles_empty() {
    let db = LocalDatabase::open_in_memory().unwrap();
    db.insert(&session("s1", 0)).unwrap();

    let found: Vec<RecordingSession> = db
        .find_by_ids(&["s1".into(), "ghost".into()])
        .unwrap();
    assert_eq!(found.len(), 1);
    assert!(db.find_by_ids::<RecordingSession>(&[]).unwrap().is_empty());
    assert_eq!(db.mark_as_uploaded::<RecordingSession>(&[]).unwrap(), 0);
}

#[test]
fn insert_rejects_id_with_batch_separator() {
    let db = LocalDatabase::open_in_memory().unwrap();
    let err = db.insert(&sample("a,b", "s1", 1)).unwrap_err();
    assert!(matches!(err, crate::Error::InvalidInput(_)));
    assert_eq!(db.count_unuploaded::<SensorDataRecord>().unwrap(), 0);
}

#[test]
fn import_with_bad_id_writes_nothing() {
    let db = LocalDatabase::open_in_memory().unwrap();
    let records = vec![
        LocalRecord::Session(session("s1", 0)),
        LocalRecord::SensorData(sample("d1,d2", "s1", 1)),
    ];
    assert!(matches!(
        db.import(&records),
        Err(crate::Error::InvalidInput(_))
    ));
    assert_eq!(db.pending_counts().unwrap(), PendingCounts::default());
}

#[test]
fn batches_beyond_sqlite_parameter_limit() {
    let db = LocalDatabase::open_in_memory().unwrap();
    let records: Vec<LocalRecord> = (0..40_000)
        .map(|i| LocalRecord::SensorData(sample(&format!("d{i}"), "s1", i)))
        .collect();
    db.import(&records).unwrap();
    let ids: Vec<String> = (0..40_000).map(|i| format!("d{i}")).collect();

    let found: Vec<SensorDataRecord> = db.find_by_ids(&ids).unwrap();
    assert_eq!(found.len(), 40_000);
    assert_eq!(found[0].id, "d0");
    assert_eq!(db.mark_as_uploaded::<SensorDataRecord>(&ids).unwrap(), 40_000);
    assert_eq!(db.count_unuploaded::<SensorDataRecord>().unwrap(), 0);
}

#[test]
fn import_mixed_records_and_count_pending() {
    let db = LocalDatabase::open_in_memory().unwrap();
    let records = vec![
        LocalRecord::Session(session("s1", 0)),
        LocalRecord::SensorData(sample("d1", "s1", 1)),
        LocalRecord::SensorData(sample("d2", "s1", 2)),
        LocalRecord::Audio(audio("a1")),
    ];

    assert_eq!(db.import(&records).unwrap(), 4);
    assert_eq!(
        db.pending_counts().unwrap(),
        PendingCounts {
            sessions: 1,
            sensor_data: 2,
            audio_files: 1,
        }
    );

    // Re-importing replaces rather than duplicates.
    db.import(&records).unwrap();
    assert_eq!(db.pending_counts().unwrap().sensor_data, 2);
}

#[test]
fn reopen_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.db");
    {
        let db = LocalDatabase::open(&path).unwrap();
        db.insert(&audio("a1")).unwrap();
    }
    let db = LocalDatabase::open(&path).unwrap();
    assert_eq!(db.count_unuploaded::<AudioRecording>().unwrap(), 1);
}
