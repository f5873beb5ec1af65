// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use fieldsync_core::{ItemStatus, DEFAULT_MAX_RETRIES};

use super::*;
use crate::commands::tests::temp_context;

#[test]
fn enqueue_applies_processor_defaults() {
    let (_dir, ctx) = temp_context();
    let processor = ctx.manual_processor().unwrap();

    let item =
        enqueue(&processor, ItemType::Session, "s1".into(), "s1".into(), None, None).unwrap();

    assert_eq!(item.status, ItemStatus::Pending);
    assert_eq!(item.priority, 0);
    assert_eq!(item.max_retries, DEFAULT_MAX_RETRIES);
    assert_eq!(processor.store().find_by_id(&item.id).unwrap(), Some(item));
}

#[test]
fn enqueue_with_explicit_priority_and_retries() {
    let (_dir, ctx) = temp_context();
    let processor = ctx.manual_processor().unwrap();

    let item = enqueue(
        &processor,
        ItemType::Audio,
        "s1".into(),
        "a1".into(),
        Some(3),
        Some(7),
    )
    .unwrap();

    assert_eq!(item.priority, 3);
    assert_eq!(item.max_retries, 7);
}

#[test]
fn enqueue_rejects_blank_session() {
    let (_dir, ctx) = temp_context();
    let processor = ctx.manual_processor().unwrap();

    let err = enqueue(&processor, ItemType::Session, " ".into(), "s1".into(), None, None)
        .unwrap_err();
    assert!(err.to_string().contains("session id cannot be empty"), "{err}");
}
