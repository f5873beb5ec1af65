// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync item identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::item::ItemType;

/// Prefix shared by all sync item IDs.
pub const ITEM_ID_PREFIX: &str = "sq";

static NONCE: AtomicU64 = AtomicU64::new(0);

/// Generate a sync item ID from the item's identity and creation time.
/// Format: sq-{hash} where hash is first 8 hex chars of
/// SHA256(session + type + item + created_at + nonce)
pub fn generate_id(session_id: &str, item_type: ItemType, item_id: &str, created_at: i64) -> String {
    let nonce = NONCE.fetch_add(1, Ordering::Relaxed);
    let input = format!("{session_id}{item_type}{item_id}{created_at}{nonce}");
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..4]);
    format!("{}-{}", ITEM_ID_PREFIX, short_hash)
}

/// Generate a unique ID, handling collisions by appending incrementing suffix.
/// An error from `exists` aborts generation.
pub fn generate_unique_id<F>(
    session_id: &str,
    item_type: ItemType,
    item_id: &str,
    created_at: i64,
    exists: F,
) -> Result<String>
where
    F: Fn(&str) -> Result<bool>,
{
    let base_id = generate_id(session_id, item_type, item_id, created_at);

    if !exists(&base_id)? {
        return Ok(base_id);
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id)? {
            return Ok(id);
        }
        suffix += 1;
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
