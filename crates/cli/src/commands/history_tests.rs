// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use fieldsync_core::SyncItemStore;

use super::*;
use crate::commands::tests::temp_context;

fn pass(started_at: i64, error: Option<&str>) -> SyncPass {
    SyncPass {
        started_at,
        duration_ms: 8,
        success: error.is_none(),
        enqueued: 2,
        error: error.map(str::to_string),
    }
}

#[test]
fn render_empty() {
    let history = HistoryJson {
        statistics: PassStatistics::default(),
        passes: Vec::new(),
    };
    assert_eq!(render_text(&history), "No sync passes recorded\n");
}

#[test]
fn render_lists_passes_with_errors() {
    let store = SyncItemStore::open_in_memory().unwrap();
    store.record_pass(&pass(0, None)).unwrap();
    store
        .record_pass(&pass(1_000, Some("audio: disk detached")))
        .unwrap();
    let history = HistoryJson {
        statistics: store.pass_statistics().unwrap(),
        passes: store.recent_passes(10).unwrap(),
    };

    assert_eq!(
        render_text(&history),
        "2 passes, 1 ok, 1 with errors, 4 items enqueued, average 8ms\n\
         - 1970-01-01 00:00:01 error 2 enqueued in 8ms\n    audio: disk detached\n\
         - 1970-01-01 00:00:00 ok 2 enqueued in 8ms\n"
    );
}

#[test]
fn clear_empties_history() {
    let (_dir, ctx) = temp_context();
    ctx.open_store().unwrap().record_pass(&pass(0, None)).unwrap();

    run(&ctx, None, true, OutputFormat::Text).unwrap();

    assert!(ctx.open_store().unwrap().recent_passes(10).unwrap().is_empty());
}
