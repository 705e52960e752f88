// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! chatsync - command-line client for a live chat service.
//!
//! The heavy lifting lives in `cs-client`; this crate resolves
//! configuration, connects a [`ChatSession`](cs_client::ChatSession) and
//! maps each subcommand onto it.

mod cli;
mod commands;
mod display;
pub mod env;
pub mod error;

pub use cli::{Cli, Command, OutputFormat};
pub use commands::resolve_config;
pub use error::{Error, Result};

use cs_client::config::default_config_path;
use cs_client::ChatSession;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Logs to stderr. `RUST_LOG` wins over the verbosity flag.
pub fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!env::no_color())
        .try_init();
}

/// Runs one command against a freshly connected session.
pub async fn run(cli: Cli) -> Result<()> {
    let path = match cli.config.or_else(env::config_path) {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = resolve_config(
        &path,
        cli.url.or_else(env::url),
        cli.session.or_else(env::session_key),
    )?;
    info!(url = %config.url, session = %config.session_key, "connecting");
    let session = ChatSession::connect(config).await?;

    let result = match cli.command {
        Command::History {
            limit,
            before_ts,
            output,
        } => commands::history(&session, limit, before_ts, output).await,
        Command::Send { text } => commands::send(&session, &text).await,
        Command::Watch { output } => commands::watch(&session, output).await,
        Command::Rate { operator, rating } => commands::rate(&session, operator, rating).await,
        Command::Close => commands::close(&session).await,
    };
    session.destroy();
    result
}
