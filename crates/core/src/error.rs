// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for cs-core decoding.

use thiserror::Error;

/// All possible errors that can occur while decoding server payloads.
#[derive(Debug, Error)]
pub enum Error {
    #[error("expected a JSON object for {0}")]
    NotAnObject(&'static str),

    #[error("missing or mistyped field '{field}' in {entity}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("invalid revision: '{0}'")]
    InvalidRevision(String),

    #[error("invalid delta event: '{0}'\n  hint: valid events are: add, upd, del")]
    InvalidEvent(String),

    #[error("server reported error: {0}")]
    ServerError(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn missing(entity: &'static str, field: &'static str) -> Self {
        Error::MissingField { entity, field }
    }
}

/// A specialized Result type for cs-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A decoded value together with the units that were rejected while decoding it.
///
/// Rejected units (one delta, one message) are reported here instead of
/// failing the whole envelope.
#[derive(Debug)]
pub struct Decoded<T> {
    pub value: T,
    pub rejected: Vec<Error>,
}

impl<T> Decoded<T> {
    pub fn new(value: T, rejected: Vec<Error>) -> Self {
        Decoded { value, rejected }
    }

    /// Drops the rejection report.
    pub fn into_value(self) -> T {
        self.value
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
