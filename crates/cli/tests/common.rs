// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `fieldsync` pointed at `temp`, isolated from the caller's environment.
pub fn fs(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("fieldsync");
    cmd.arg("--data-dir")
        .arg(temp.path())
        .env_remove("FIELDSYNC_DATA_DIR")
        .env_remove("FIELDSYNC_AUTH_TOKEN")
        .env_remove("FIELDSYNC_BASE_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Writes a JSONL import file into `temp` and returns its path.
pub fn write_records(temp: &TempDir, lines: &[&str]) -> PathBuf {
    let path = temp.path().join("records.jsonl");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

pub const SESSION: &str = r#"{"kind":"session","id":"s1","session_id":"s1","start_time":1700000000000}"#;
pub const SAMPLE_1: &str =
    r#"{"kind":"sensor_data","id":"d1","session_id":"s1","sensor_type":"gps","timestamp":1}"#;
pub const SAMPLE_2: &str =
    r#"{"kind":"sensor_data","id":"d2","session_id":"s1","sensor_type":"gps","timestamp":2}"#;
pub const AUDIO: &str =
    r#"{"kind":"audio","id":"a1","session_id":"s1","timestamp":3,"file_path":"/rec/a1.m4a"}"#;

/// Enqueues an item and returns its generated id.
pub fn enqueue(temp: &TempDir, item_type: &str, session_id: &str, item_id: &str) -> String {
    let output = fs(temp)
        .args(["enqueue", item_type, session_id, item_id, "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let item: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    item["id"].as_str().unwrap().to_string()
}

/// Points the server at a closed local port with transport retries off.
pub fn write_unreachable_config(temp: &TempDir) {
    std::fs::write(
        temp.path().join("config.toml"),
        "[server]\nbase_url = \"http://127.0.0.1:9\"\ntimeout_secs = 2\nretry_attempts = 0\n",
    )
    .unwrap();
}
