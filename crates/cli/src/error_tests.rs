// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn test_no_url_names_the_config_file() {
    let msg = Error::NoUrl("/tmp/chatsync.toml".into()).to_string();
    assert!(msg.contains("no service URL"));
    assert!(msg.contains("/tmp/chatsync.toml"));
    assert!(msg.contains("--url"));
}

#[test]
fn test_action_errors_pass_through() {
    let err = Error::from(ActionError::NotStarted);
    assert_eq!(err.to_string(), "action loop is not running");
}

#[test]
fn test_config_errors_pass_through() {
    let err = Error::from(ConfigError::Invalid("url must use ws:// or wss://".into()));
    assert!(err.to_string().contains("ws://"));
}
