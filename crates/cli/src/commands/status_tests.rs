// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn pending(sessions: usize, sensor_data: usize, audio_files: usize) -> PendingCounts {
    PendingCounts {
        sessions,
        sensor_data,
        audio_files,
    }
}

#[test]
fn collect_copies_pending_counts() {
    let queue = QueueStats {
        total: 3,
        pending: 2,
        completed: 1,
        ..Default::default()
    };
    let status = collect(&pending(1, 120, 2), queue, Some(5), PassStatistics::default());

    assert_eq!(status.pending_sessions, 1);
    assert_eq!(status.pending_sensor_data, 120);
    assert_eq!(status.pending_audio_files, 2);
    assert_eq!(status.queue, queue);
    assert_eq!(status.next_retry_at, Some(5));
}

#[test]
fn render_idle_queue() {
    let status = collect(
        &pending(0, 0, 0),
        QueueStats::default(),
        None,
        PassStatistics::default(),
    );
    assert_eq!(
        render_text(&status),
        "Not uploaded: 0 sessions, 0 sensor samples, 0 audio files\n\
         Queue: 0 total, 0 pending, 0 in progress, 0 completed, 0 failed\n"
    );
}

#[test]
fn render_mentions_exhausted_items_and_next_retry() {
    let queue = QueueStats {
        total: 2,
        pending: 1,
        failed: 1,
        expired: 1,
        ..Default::default()
    };
    let text = render_text(&collect(
        &pending(0, 0, 0),
        queue,
        Some(0),
        PassStatistics::default(),
    ));

    assert!(text.contains("1 failed items exhausted their retries"));
    assert!(text.ends_with("Next retry: 1970-01-01 00:00:00\n"));
}

#[test]
fn json_shape() {
    let status = collect(
        &pending(1, 0, 0),
        QueueStats::default(),
        None,
        PassStatistics::default(),
    );
    let value = serde_json::to_value(&status).unwrap();

    assert_eq!(value["pending_sessions"], 1);
    assert_eq!(value["queue"]["total"], 0);
    assert!(value["next_retry_at"].is_null());
    assert_eq!(value["passes"]["total"], 0);
}

#[test]
fn render_pass_history_summary() {
    let passes = PassStatistics {
        total: 4,
        successful: 3,
        failed: 1,
        items_enqueued: 9,
        average_duration_ms: 12,
        last_pass_at: Some(60_000),
        last_success_at: Some(0),
    };
    let text = render_text(&collect(&pending(0, 0, 0), QueueStats::default(), None, passes));

    assert!(text.ends_with(
        "Sync passes: 4 (3 ok, 1 with errors), average 12ms\n\
         Last successful sync: 1970-01-01 00:00:00\n"
    ));
}
