// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;
use yare::parameterized;

fn write(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn minimal_config_gets_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, r#"url = "wss://chat.example.com/ws""#);

    let config = ClientConfig::load(&path).unwrap();

    assert_eq!(config, ClientConfig::new("wss://chat.example.com/ws"));
    assert_eq!(config.session_key, "default");
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.lane_concurrency, 1);
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
    assert!(config.store_path.is_none());
}

#[test]
fn explicit_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        r#"
url = "ws://localhost:9000"
session_key = "visitor-42"
store_path = "/tmp/chat.db"
max_retries = 2
initial_delay_ms = 50
max_delay_secs = 1
lane_concurrency = 3
"#,
    );

    let config = ClientConfig::load(&path).unwrap();

    assert_eq!(config.session_key, "visitor-42");
    assert_eq!(config.store_path, Some(PathBuf::from("/tmp/chat.db")));
    assert_eq!(config.lane_concurrency, 3);
    let policy = config.retry_policy();
    assert_eq!(policy.max_retries, 2);
    assert_eq!(policy.initial_delay, Duration::from_millis(50));
    assert_eq!(policy.max_delay, Duration::from_secs(1));
}

#[test]
fn save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut config = ClientConfig::new("wss://chat.example.com/ws");
    config.store_path = Some(PathBuf::from("/var/lib/chat.db"));

    config.save(&path).unwrap();

    assert_eq!(ClientConfig::load(&path).unwrap(), config);
}

#[parameterized(
    http_url = { r#"url = "https://chat.example.com""# },
    empty_session = { "url = \"ws://x\"\nsession_key = \"\"" },
    zero_concurrency = { "url = \"ws://x\"\nlane_concurrency = 0" },
    zero_timeout = { "url = \"ws://x\"\nrequest_timeout_ms = 0" },
)]
fn invalid_settings_are_rejected(content: &str) {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, content);

    let err = ClientConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got {err}");
}

#[test]
fn missing_url_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "max_retries = 1");

    assert!(matches!(
        ClientConfig::load(&path).unwrap_err(),
        ConfigError::Parse(_)
    ));
}

#[test]
fn missing_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ClientConfig::load(&path).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}
