// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use clap::CommandFactory;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_default() {
    let cli = parse(&["fieldsync", "status"]).unwrap();
    assert!(cli.data_dir.is_none());
    assert!(!cli.verbose);
}

#[test]
fn test_data_dir_before_command() {
    let cli = parse(&["fieldsync", "--data-dir", "/tmp/fs", "status"]).unwrap();
    assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/fs")));
}

#[test]
fn test_global_flags_after_command() {
    let cli = parse(&["fieldsync", "sync", "-v", "--data-dir", "/tmp/fs"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/fs")));
}

#[test]
fn test_output_defaults_to_text() {
    let cli = parse(&["fieldsync", "status"]).unwrap();
    match cli.command {
        Command::Status { output } => assert_eq!(output.output, OutputFormat::Text),
        other => panic!("Expected Status command, got {other:?}"),
    }
}

#[test]
fn test_output_json_short_flag() {
    let cli = parse(&["fieldsync", "status", "-o", "json"]).unwrap();
    match cli.command {
        Command::Status { output } => assert_eq!(output.output, OutputFormat::Json),
        other => panic!("Expected Status command, got {other:?}"),
    }
}

#[test]
fn test_invalid_output_rejected() {
    assert!(parse(&["fieldsync", "status", "-o", "yaml"]).is_err());
}

#[test]
fn test_command_required() {
    assert!(parse(&["fieldsync"]).is_err());
}
