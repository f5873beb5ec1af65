// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::Error;

#[test]
fn id_has_prefix_and_hash() {
    let id = generate_id("s1", ItemType::Session, "rec-1", 1_000);
    assert!(id.starts_with("sq-"));
    assert_eq!(id.len(), "sq-".len() + 8);
    assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn same_inputs_produce_distinct_ids() {
    let a = generate_id("s1", ItemType::SensorData, "r1,r2", 1_000);
    let b = generate_id("s1", ItemType::SensorData, "r1,r2", 1_000);
    assert_ne!(a, b);
}

#[test]
fn collision_appends_suffix() {
    let id = generate_unique_id("s1", ItemType::Audio, "a1", 1_000, |candidate| {
        Ok(!candidate.ends_with("-2"))
    })
    .unwrap();
    assert!(id.ends_with("-2"));
}

#[test]
fn collision_keeps_counting() {
    let id = generate_unique_id("s1", ItemType::Audio, "a1", 1_000, |candidate| {
        Ok(!candidate.ends_with("-4"))
    })
    .unwrap();
    assert!(id.ends_with("-4"));
}

#[test]
fn lookup_error_is_propagated() {
    let result = generate_unique_id("s1", ItemType::Audio, "a1", 1_000, |_| {
        Err(Error::Database(rusqlite::Error::InvalidQuery))
    });
    assert!(matches!(result, Err(Error::Database(_))));
}
