// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delta stream revision.
//!
//! The server stamps every delta batch with a revision. On the wire it is a
//! number or a numeric string; locally it is a signed 64-bit integer with the
//! natural ordering.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::json::value_as_i64;

/// A totally ordered delta stream revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(i64);

impl Revision {
    /// Creates a revision from its numeric value.
    pub fn new(value: i64) -> Self {
        Revision(value)
    }

    /// Returns the numeric value.
    pub fn value(self) -> i64 {
        self.0
    }

    /// Decodes a revision from a JSON number or numeric string.
    pub fn from_json(value: &Value) -> Result<Self> {
        value_as_i64(value)
            .map(Revision)
            .ok_or_else(|| Error::InvalidRevision(value.to_string()))
    }

    /// Returns true if this revision is strictly newer than `last`.
    ///
    /// Every revision is newer than "nothing applied yet".
    pub fn is_newer_than(self, last: Option<Revision>) -> bool {
        match last {
            Some(last) => self > last,
            None => true,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(Revision)
            .map_err(|_| Error::InvalidRevision(s.to_string()))
    }
}

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in microseconds since Unix epoch.
    fn now_micros(&self) -> i64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_micros(&self) -> i64 {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "revision_tests.rs"]
mod tests;
