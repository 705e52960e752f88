// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `CHATSYNC_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::CHATSYNC_CONFIG).map(PathBuf::from)
}

/// Returns the value of `CHATSYNC_URL` if set.
pub fn url() -> Option<String> {
    non_empty(vars::CHATSYNC_URL)
}

/// Returns the value of `CHATSYNC_SESSION` if set.
pub fn session_key() -> Option<String> {
    non_empty(vars::CHATSYNC_SESSION)
}

/// Returns `true` if `NO_COLOR` is set to anything but the empty string.
pub fn no_color() -> bool {
    non_empty(vars::NO_COLOR).is_some()
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
