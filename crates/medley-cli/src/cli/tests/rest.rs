//! Tests for sanitize, check, config, global flags, and console output.

use super::parse;
use crate::cli::commands::config::render_config;
use crate::cli::observer::format_progress;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use medley_core::config::EngineConfig;
use medley_core::{EngineState, StatusRecord};

#[test]
fn cli_parse_sanitize() {
    match parse(&["medley", "sanitize"]) {
        CliCommand::Sanitize => {}
        _ => panic!("expected Sanitize"),
    }
}

#[test]
fn cli_parse_check() {
    match parse(&["medley", "check"]) {
        CliCommand::Check => {}
        _ => panic!("expected Check"),
    }
}

#[test]
fn cli_parse_global_config_after_subcommand() {
    let cli = Cli::try_parse_from(["medley", "config", "--config", "/etc/medley.toml"]).unwrap();
    assert!(matches!(cli.command, CliCommand::Config));
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/etc/medley.toml"))
    );
}

#[test]
fn cli_parse_requires_subcommand() {
    assert!(Cli::try_parse_from(["medley"]).is_err());
}

#[test]
fn rendered_config_masks_secret() {
    let cfg = EngineConfig {
        client_id: Some("id123".into()),
        client_secret: Some("hunter2".into()),
        ..EngineConfig::default()
    };
    let out = render_config(&cfg).unwrap();
    assert!(out.contains("id123"));
    assert!(!out.contains("hunter2"));
    assert!(out.contains("********"));
}

#[test]
fn progress_line_formats() {
    let mut status = StatusRecord {
        state: EngineState::Downloading,
        current_item: Some("Song A".into()),
        total_items: 0,
        downloaded_count: 1,
        playlist_name: None,
    };
    assert_eq!(format_progress(&status), "[1/?] downloading: Song A");
    status.total_items = 12;
    status.current_item = None;
    status.state = EngineState::Idle;
    assert_eq!(format_progress(&status), "[1/12] idle");
}
