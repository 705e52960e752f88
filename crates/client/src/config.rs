// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Stored as TOML, by default in `<config dir>/chatsync/config.toml`:
//!
//! ```toml
//! url = "wss://chat.example.com/ws"
//! session_key = "visitor-42"
//! store_path = "/home/me/.local/share/chatsync/state.db"
//! max_retries = 5
//! ```
//!
//! Only `url` is required.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::action_loop::RetryPolicy;

const APP_DIR_NAME: &str = "chatsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const STORE_FILE_NAME: &str = "state.db";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config: {0}")]
    Write(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("no config directory on this platform")]
    NoConfigDir,
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of one chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the chat service (`ws://` or `wss://`).
    pub url: String,
    /// Stable key of the session; namespaces persisted state.
    #[serde(default = "default_session_key")]
    pub session_key: String,
    /// SQLite file for persisted session state. In-memory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// Retries of a transient failure before a request fails.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First retry delay in milliseconds; doubles per attempt.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound of the retry delay in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    /// Requests of one lane allowed in flight at once.
    #[serde(default = "default_lane_concurrency")]
    pub lane_concurrency: usize,
    /// How long to wait for the response to one request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_session_key() -> String {
    "default".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    100
}

fn default_max_delay_secs() -> u64 {
    5
}

fn default_lane_concurrency() -> usize {
    1
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl ClientConfig {
    /// Creates a config for `url` with every other setting at its default.
    pub fn new(url: impl Into<String>) -> Self {
        ClientConfig {
            url: url.into(),
            session_key: default_session_key(),
            store_path: None,
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
            lane_concurrency: default_lane_concurrency(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Loads and validates the config file at `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ClientConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Checks the settings that would otherwise fail later at runtime.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "url '{}' must start with ws:// or wss://",
                self.url
            )));
        }
        if self.session_key.is_empty() {
            return Err(ConfigError::Invalid("session_key must not be empty".into()));
        }
        if self.lane_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "lane_concurrency must be at least 1".into(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Default location of the config file.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

/// Default location of the state database.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join(STORE_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
