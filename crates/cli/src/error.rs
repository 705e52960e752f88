// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use cs_client::{ActionError, ConfigError, SessionError};
use thiserror::Error;

/// Errors reported by the `chatsync` command.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no service URL configured\n  hint: pass --url, set CHATSYNC_URL, or add `url` to {0}")]
    NoUrl(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error("there is no operator to rate\n  hint: pass --operator <id>")]
    NoOperator,

    #[error("the session stopped before the request completed")]
    Interrupted,

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
