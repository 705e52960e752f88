// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! History page responses.
//!
//! Both pagination directions share one envelope:
//!
//! ```text
//! {"result": "ok", "data": {"hasMore": true, "messages": [...], "revision": "..."}}
//! ```
//!
//! `revision` is only sent for "since" pages. A since page may also report
//! deletions as `{"id": ..., "deleted": true}` entries.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Decoded, Error, Result};
use crate::json;
use crate::message::{decode_messages, HistoryMessage};

/// One page of history, older ("before") or newer ("since").
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HistoryPage {
    pub has_more: bool,
    /// Opaque revision to pass as `since` for the next page.
    pub revision: Option<String>,
    pub messages: Vec<HistoryMessage>,
    /// Ids of messages the server reports as deleted (`"deleted": true`).
    pub deleted: Vec<String>,
}

impl HistoryPage {
    /// Decodes a history response.
    ///
    /// A top-level `error`, or a `result` other than `"ok"`, fails the page.
    /// An absent `data` object is an empty page; messages that fail to
    /// decode are rejected individually.
    pub fn from_json(value: &Value) -> Result<Decoded<Self>> {
        let obj = value.as_object().ok_or(Error::NotAnObject("history response"))?;

        if let Some(code) = json::string(obj, "error") {
            return Err(Error::ServerError(code));
        }
        if let Some(result) = json::string(obj, "result") {
            if result != "ok" {
                return Err(Error::ServerError(result));
            }
        }

        let Some(data) = json::object(obj, "data") else {
            return Ok(Decoded::new(HistoryPage::default(), Vec::new()));
        };

        let mut live = Vec::new();
        let mut deleted = Vec::new();
        for value in json::array(data, "messages").map(Vec::as_slice).unwrap_or_default() {
            match deleted_id(value) {
                Some(id) => deleted.push(id),
                None => live.push(value.clone()),
            }
        }
        let (messages, rejected) = decode_messages(&live);

        let page = HistoryPage {
            has_more: json::boolean(data, "hasMore").unwrap_or(false),
            revision: json::id(data, "revision"),
            messages,
            deleted,
        };
        Ok(Decoded::new(page, rejected))
    }
}

fn deleted_id(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    if json::boolean(obj, "deleted") != Some(true) {
        return None;
    }
    json::id(obj, "id")
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
