// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

#[test]
fn config_prints_defaults() {
    let temp = TempDir::new().unwrap();
    fs(&temp)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(not found, using defaults)"))
        .stdout(predicate::str::contains("base_url = \"http://localhost:3000/api\""));
}

#[test]
fn config_applies_env_overrides_and_masks_token() {
    let temp = TempDir::new().unwrap();
    fs(&temp)
        .arg("config")
        .env("FIELDSYNC_BASE_URL", "https://field.example.org/api")
        .env("FIELDSYNC_AUTH_TOKEN", "tok-123")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://field.example.org/api"))
        .stdout(predicate::str::contains("tok-123").not());
}

#[test]
fn invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "[queue]\nconcurrency = 0\n").unwrap();

    fs(&temp)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn unparseable_config_is_reported() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "[sync\n").unwrap();

    fs(&temp)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config error"));
}

#[test]
fn zero_sync_interval_is_reported() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("config.toml"),
        "[sync]\nsync_interval_secs = 0\n",
    )
    .unwrap();

    fs(&temp)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sync_interval_secs"));
}
