// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn session(session_id: &str, start_time: i64) -> RecordingSession {
    RecordingSession {
        id: session_id.to_string(),
        session_id: session_id.to_string(),
        start_time,
        end_time: None,
        is_active: false,
        enabled_sensors: Vec::new(),
        sample_rate: 50,
        data_count: 0,
        notes: None,
        is_uploaded: false,
    }
}

fn sample(session_id: &str, sensor_type: &str, timestamp: i64) -> SensorDataRecord {
    SensorDataRecord {
        id: "d1".into(),
        session_id: session_id.to_string(),
        sensor_type: sensor_type.to_string(),
        timestamp,
        x: None,
        y: None,
        z: None,
        latitude: None,
        longitude: None,
        altitude: None,
        accuracy: None,
        speed: None,
        heading: None,
        is_uploaded: false,
    }
}

fn audio(session_id: &str, timestamp: i64) -> AudioRecording {
    AudioRecording {
        id: "a1".into(),
        session_id: session_id.to_string(),
        timestamp,
        file_path: "/rec/a1.m4a".into(),
        file_size: 1,
        duration: 1.0,
        sample_rate: 44_100,
        channels: 1,
        format: "m4a".into(),
        is_uploaded: false,
        uploaded_url: None,
    }
}

#[test]
fn default_allows_everything() {
    let filter = SyncFilter::default();
    assert!(filter.is_unrestricted());
    assert!(filter.matches_session(&session("s1", 0)));
    assert!(filter.matches_sample(&sample("s1", "gps", 0)));
    assert!(filter.matches_audio(&audio("s1", 0)));
}

#[parameterized(
    audio_only_session = { SyncFilter::audio_only(), ItemType::Session, false },
    audio_only_audio = { SyncFilter::audio_only(), ItemType::Audio, true },
    metadata_only_session = { SyncFilter::metadata_only(), ItemType::Session, true },
    metadata_only_samples = { SyncFilter::metadata_only(), ItemType::SensorData, false },
    no_audio_audio = { SyncFilter::no_audio(), ItemType::Audio, false },
    no_audio_samples = { SyncFilter::no_audio(), ItemType::SensorData, true },
)]
fn presets_select_types(filter: SyncFilter, item_type: ItemType, allowed: bool) {
    assert_eq!(filter.allows_type(item_type), allowed);
}

#[test]
fn exclude_audio_wins_over_type_list() {
    let filter = SyncFilter {
        item_types: vec![ItemType::Audio],
        exclude_audio: true,
        ..SyncFilter::default()
    };
    assert!(!filter.matches_audio(&audio("s1", 0)));
}

#[test]
fn session_list_applies_to_every_record_kind() {
    let filter = SyncFilter {
        session_ids: vec!["s2".into()],
        ..SyncFilter::default()
    };
    assert!(!filter.matches_session(&session("s1", 0)));
    assert!(filter.matches_session(&session("s2", 0)));
    assert!(!filter.matches_sample(&sample("s1", "gps", 0)));
    assert!(filter.matches_audio(&audio("s2", 0)));
}

#[test]
fn excluded_sensor_types_ignore_case() {
    let filter = SyncFilter {
        exclude_sensor_types: vec!["GPS".into()],
        ..SyncFilter::default()
    };
    assert!(!filter.matches_sample(&sample("s1", "gps", 0)));
    assert!(filter.matches_sample(&sample("s1", "accelerometer", 0)));
}

#[parameterized(
    before = { 99, false },
    at_start = { 100, true },
    inside = { 150, true },
    at_end = { 200, true },
    after = { 201, false },
)]
fn time_range_is_inclusive(time: i64, allowed: bool) {
    let filter = SyncFilter {
        since: Some(100),
        until: Some(200),
        ..SyncFilter::default()
    };
    assert_eq!(filter.matches_sample(&sample("s1", "gps", time)), allowed);
    assert_eq!(filter.matches_session(&session("s1", time)), allowed);
    assert_eq!(filter.matches_audio(&audio("s1", time)), allowed);
}

#[test]
fn parses_from_partial_document() {
    let filter: SyncFilter =
        serde_json::from_str(r#"{"item_types":["session","audio"],"since":5}"#).unwrap();
    assert_eq!(filter.item_types, vec![ItemType::Session, ItemType::Audio]);
    assert_eq!(filter.since, Some(5));
    assert!(!filter.exclude_audio);
}
