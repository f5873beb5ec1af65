// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use fieldsync_core::{ItemStatus, ItemType, NewSyncItem};
use yare::parameterized;

use super::*;

/// One completed, one exhausted and one pending item.
fn seeded_store() -> SyncItemStore {
    let store = SyncItemStore::open_in_memory().unwrap();
    let done = store
        .create(NewSyncItem::new("s1", ItemType::Session, "s1"))
        .unwrap();
    store.mark_completed(&done.id).unwrap();
    let dead = store
        .create(NewSyncItem::new("s1", ItemType::Audio, "a1"))
        .unwrap();
    store.mark_exhausted(&dead.id, "audio file not found").unwrap();
    store
        .create(NewSyncItem::new("s1", ItemType::SensorData, "d1"))
        .unwrap();
    store
}

#[parameterized(
    neither_flag_means_both = { false, false, 1, 1 },
    completed_only = { true, false, 1, 0 },
    expired_only = { false, true, 0, 1 },
    both_flags = { true, true, 1, 1 },
)]
fn cleanup_selects_classes(
    completed: bool,
    expired: bool,
    want_completed: usize,
    want_expired: usize,
) {
    let store = seeded_store();

    let cleaned = cleanup(&store, completed, expired).unwrap();

    assert_eq!(
        cleaned,
        Cleaned {
            completed: want_completed,
            expired: want_expired,
        }
    );
    assert_eq!(
        store.find_all().unwrap().len(),
        3 - want_completed - want_expired
    );
}

#[test]
fn cleanup_never_touches_pending_items() {
    let store = seeded_store();
    cleanup(&store, false, false).unwrap();

    let left = store.find_all().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].status, ItemStatus::Pending);
}

#[test]
fn cleanup_keeps_failed_items_with_retries_left() {
    let store = SyncItemStore::open_in_memory().unwrap();
    let item = store
        .create(NewSyncItem::new("s1", ItemType::Session, "s1").with_max_retries(5))
        .unwrap();
    store.mark_failed(&item.id, "timeout", 1_000).unwrap();

    assert_eq!(cleanup(&store, false, true).unwrap().expired, 0);
    assert_eq!(store.find_all().unwrap().len(), 1);
}

#[test]
fn retry_failed_requeues_exhausted_items() {
    let (_dir, ctx) = crate::commands::tests::temp_context();
    let store = ctx.open_store().unwrap();
    let item = store
        .create(NewSyncItem::new("s1", ItemType::Audio, "a1"))
        .unwrap();
    store.mark_exhausted(&item.id, "gone").unwrap();
    drop(store);

    retry_failed(&ctx).unwrap();

    let item = ctx.open_store().unwrap().get(&item.id).unwrap();
    assert_eq!(item.status, ItemStatus::Pending);
    assert_eq!(item.retry_count, 0);
    assert!(item.error_message.is_none());
}
