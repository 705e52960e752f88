// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Command implementations on top of a connected [`ChatSession`].

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

use cs_client::config::default_store_path;
use cs_client::{ActionResult, ApplyOutcome, ChatSession, ClientConfig};
use cs_core::HistoryMessage;

use crate::cli::OutputFormat;
use crate::display::{format_message, format_messages_json, format_outcome, outcome_json};
use crate::error::{Error, Result};

/// How long to wait for the first state update after connecting.
const INITIAL_STATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Loads the config at `path` and applies the overrides.
///
/// A missing file is fine as long as a URL is supplied; the session then
/// persists to the default store location.
pub fn resolve_config(
    path: &Path,
    url: Option<String>,
    session: Option<String>,
) -> Result<ClientConfig> {
    let mut config = if path.exists() {
        ClientConfig::load(path)?
    } else {
        debug!(path = %path.display(), "no config file");
        let url = url
            .clone()
            .ok_or_else(|| Error::NoUrl(path.display().to_string()))?;
        let mut config = ClientConfig::new(url);
        config.store_path = default_store_path();
        config
    };
    if let Some(url) = url {
        config.url = url;
    }
    if let Some(session) = session {
        config.session_key = session;
    }
    config.validate()?;
    Ok(config)
}

/// Waits until the session has state from the server, or the timeout
/// passes. Commands that depend on the current chat call this first.
async fn wait_for_state(session: &ChatSession) {
    let mut events = session.subscribe();
    if session.state().revision().is_some() {
        return;
    }
    if tokio::time::timeout(INITIAL_STATE_TIMEOUT, events.recv())
        .await
        .is_err()
    {
        warn!("no state received from the server yet");
    }
}

/// Runs `start`, handing it a completion, and waits for that completion.
async fn complete<T, F>(start: F) -> Result<Value>
where
    F: FnOnce(Box<dyn FnOnce(ActionResult<Value>) + Send>) -> ActionResult<T>,
{
    let (tx, rx) = oneshot::channel();
    start(Box::new(move |result| {
        let _ = tx.send(result);
    }))?;
    let value = rx.await.map_err(|_| Error::Interrupted)??;
    Ok(value)
}

pub async fn history(
    session: &ChatSession,
    limit: usize,
    before_ts: Option<i64>,
    output: OutputFormat,
) -> Result<()> {
    let messages = match before_ts {
        Some(ts) => {
            let page = session.history_provider().history_before(ts).await?;
            newest(page.messages, limit)
        }
        None => {
            wait_for_state(session).await;
            let history = session.history();
            if history.len() < limit && history.has_more_before() {
                let oldest = history
                    .full_history()
                    .first()
                    .map(|m| m.time_in_microsecond)
                    .unwrap_or_else(|| chrono::Utc::now().timestamp_micros());
                session.history_provider().history_before(oldest).await?;
            }
            history.latest(limit)
        }
    };
    print_messages(&messages, output)
}

fn newest(mut messages: Vec<HistoryMessage>, limit: usize) -> Vec<HistoryMessage> {
    messages.sort_by_key(|m| m.time_in_microsecond);
    let skip = messages.len().saturating_sub(limit);
    messages.split_off(skip)
}

fn print_messages(messages: &[HistoryMessage], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Text => {
            if messages.is_empty() {
                println!("No messages");
            }
            for message in messages {
                println!("{}", format_message(message));
            }
        }
        OutputFormat::Json => println!("{}", format_messages_json(messages)?),
    }
    Ok(())
}

pub async fn send(session: &ChatSession, text: &str) -> Result<()> {
    wait_for_state(session).await;
    let mut client_side_id = String::new();
    complete(|done| {
        client_side_id = session.send_message(text, done)?;
        Ok(())
    })
    .await?;
    println!("Sent {}", client_side_id);
    Ok(())
}

pub async fn watch(session: &ChatSession, output: OutputFormat) -> Result<()> {
    let mut events = session.subscribe();
    let mut last_seen = session
        .history()
        .full_history()
        .last()
        .map(|m| m.time_in_microsecond);

    loop {
        let outcome = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(outcome) => outcome,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(missed = n, "watch fell behind");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };
        let chat = session.state().chat();
        match output {
            OutputFormat::Text => {
                println!("{}", format_outcome(&outcome, chat.as_ref()));
                if let ApplyOutcome::Applied(_) = outcome {
                    last_seen = print_new_messages(session, last_seen);
                }
            }
            OutputFormat::Json => {
                println!("{}", outcome_json(&outcome, chat.as_ref()));
            }
        }
    }
    Ok(())
}

/// Prints messages newer than `since` and returns the newest timestamp.
fn print_new_messages(session: &ChatSession, since: Option<i64>) -> Option<i64> {
    let mut newest = since;
    for message in session.history().full_history() {
        if since.is_some_and(|ts| message.time_in_microsecond <= ts) {
            continue;
        }
        println!("  {}", format_message(&message));
        newest = Some(message.time_in_microsecond);
    }
    newest
}

pub async fn rate(session: &ChatSession, operator: Option<String>, rating: u8) -> Result<()> {
    let operator = match operator {
        Some(id) => id,
        None => {
            wait_for_state(session).await;
            session
                .state()
                .chat()
                .and_then(|chat| chat.operator)
                .map(|op| op.id)
                .ok_or(Error::NoOperator)?
        }
    };
    complete(|done| session.actions().rate_operator(&operator, rating, done)).await?;
    println!("Rated operator {} with {}", operator, rating);
    Ok(())
}

pub async fn close(session: &ChatSession) -> Result<()> {
    complete(|done| session.actions().close_chat(done)).await?;
    println!("Chat closed");
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
