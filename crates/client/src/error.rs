// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session-level error type.
//!
//! Each component has its own error enum; [`SessionError`] wraps them for
//! callers that drive a whole [`ChatSession`](crate::ChatSession).

use thiserror::Error;

use crate::action_loop::ActionError;
use crate::config::ConfigError;
use crate::store::StoreError;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("action failed: {0}")]
    Action(#[from] ActionError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport has no delta feed")]
    NoDeltaFeed,

    #[error("session destroyed")]
    Destroyed,
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
