// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for commands printing messages or events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  chatsync --url wss://chat.example.com/ws history   Show recent messages
  chatsync send \"Hello\"                              Send a message
  chatsync watch                                     Follow the chat live";

#[derive(Parser, Debug)]
#[command(name = "chatsync")]
#[command(version)]
#[command(about = "Command-line client for a live chat service")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Config file (default: <config dir>/chatsync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Service URL, overriding the config file
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Session key, overriding the config file
    #[arg(long, global = true)]
    pub session: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show message history
    History {
        /// Number of messages to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Only messages older than this timestamp (microseconds)
        #[arg(long)]
        before_ts: Option<i64>,

        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Send a message, starting a chat if none is open
    Send {
        /// Message text
        text: String,
    },

    /// Follow the chat and print every change until interrupted
    Watch {
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Rate an operator from 1 (worst) to 5 (best)
    Rate {
        /// Operator id; defaults to the operator of the current chat
        #[arg(long)]
        operator: Option<String>,

        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
    },

    /// Close the current chat
    Close,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
