// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use clap::CommandFactory;
use yare::parameterized;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("chatsync").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_history_defaults() {
    let cli = parse(&["history"]);
    assert_eq!(
        cli.command,
        Command::History {
            limit: 20,
            before_ts: None,
            output: OutputFormat::Text,
        }
    );
    assert!(!cli.verbose);
    assert!(cli.config.is_none());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["send", "hi there", "-v", "--url", "ws://x", "--session", "s1"]);
    assert_eq!(
        cli.command,
        Command::Send {
            text: "hi there".into()
        }
    );
    assert!(cli.verbose);
    assert_eq!(cli.url.as_deref(), Some("ws://x"));
    assert_eq!(cli.session.as_deref(), Some("s1"));
}

#[test]
fn test_watch_json() {
    let cli = parse(&["watch", "-o", "json"]);
    assert_eq!(
        cli.command,
        Command::Watch {
            output: OutputFormat::Json
        }
    );
}

#[test]
fn test_rate_with_operator() {
    let cli = parse(&["rate", "--operator", "33201", "4"]);
    assert_eq!(
        cli.command,
        Command::Rate {
            operator: Some("33201".into()),
            rating: 4,
        }
    );
}

#[parameterized(
    zero = { "0" },
    six = { "6" },
    word = { "great" },
)]
fn test_rate_rejects_out_of_range(rating: &str) {
    let result = Cli::try_parse_from(["chatsync", "rate", rating]);
    assert!(result.is_err());
}

#[test]
fn test_missing_subcommand_is_error() {
    assert!(Cli::try_parse_from(["chatsync"]).is_err());
}
