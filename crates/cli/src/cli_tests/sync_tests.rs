// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_run() {
    let cli = parse(&["fieldsync", "run"]).unwrap();
    assert!(matches!(cli.command, Command::Run));
}

#[test]
fn test_sync_json() {
    let cli = parse(&["fieldsync", "sync", "--output", "json"]).unwrap();
    match cli.command {
        Command::Sync {
            only,
            no_audio,
            output,
        } => {
            assert_eq!(output.output, OutputFormat::Json);
            assert!(only.is_empty());
            assert!(!no_audio);
        }
        other => panic!("Expected Sync command, got {other:?}"),
    }
}

#[test]
fn test_sync_filter_flags() {
    let cli = parse(&[
        "fieldsync", "sync", "--only", "session", "--only", "sensor_data", "--no-audio",
    ])
    .unwrap();
    match cli.command {
        Command::Sync { only, no_audio, .. } => {
            assert_eq!(only, vec![ItemType::Session, ItemType::SensorData]);
            assert!(no_audio);
        }
        other => panic!("Expected Sync command, got {other:?}"),
    }
}

#[test]
fn test_sync_rejects_unknown_type() {
    assert!(parse(&["fieldsync", "sync", "--only", "video"]).is_err());
}

#[test]
fn test_history_limit_and_clear() {
    let cli = parse(&["fieldsync", "history", "-n", "5"]).unwrap();
    match cli.command {
        Command::History { limit, clear, .. } => {
            assert_eq!(limit, Some(5));
            assert!(!clear);
        }
        other => panic!("Expected History command, got {other:?}"),
    }
    assert!(parse(&["fieldsync", "history", "--clear", "-n", "5"]).is_err());
}

#[test]
fn test_import_path() {
    let cli = parse(&["fieldsync", "import", "records.jsonl"]).unwrap();
    match cli.command {
        Command::Import { file, .. } => assert_eq!(file, PathBuf::from("records.jsonl")),
        other => panic!("Expected Import command, got {other:?}"),
    }
}

#[test]
fn test_import_requires_file() {
    assert!(parse(&["fieldsync", "import"]).is_err());
}

#[test]
fn test_config() {
    let cli = parse(&["fieldsync", "config"]).unwrap();
    assert!(matches!(cli.command, Command::Config));
}
