// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pulls history pages from the service into the timeline.
//!
//! "Before" pages walk backwards from a timestamp; "since" pages walk
//! forward from a revision and are chained until the server reports no
//! more. Both are fetched on the history lane of the action loop and merged
//! into the shared [`HistoryStorage`] before the caller's completion runs.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use cs_core::protocol::{Parameter, ServerErrorCode};
use cs_core::{Error as DecodeError, HistoryPage};

use crate::action_loop::{ActionError, ActionRequest, ActionRequestLoop, ActionResult};
use crate::history::storage::HistoryStorage;

type SinceCallback = Box<dyn FnOnce(ActionResult<usize>) + Send>;

/// Completion of a since chain, shared by the chain's requests and taken
/// by whichever step ends it.
type SinceCompletion = Arc<Mutex<Option<SinceCallback>>>;

fn finish(slot: &SinceCompletion, result: ActionResult<usize>) {
    let completion = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    if let Some(completion) = completion {
        completion(result);
    }
}

/// Fetches history pages and merges them into the timeline.
#[derive(Clone)]
pub struct RemoteHistoryProvider {
    requests: Arc<ActionRequestLoop>,
    storage: Arc<dyn HistoryStorage>,
}

impl RemoteHistoryProvider {
    pub fn new(requests: Arc<ActionRequestLoop>, storage: Arc<dyn HistoryStorage>) -> Self {
        RemoteHistoryProvider { requests, storage }
    }

    pub fn storage(&self) -> &Arc<dyn HistoryStorage> {
        &self.storage
    }

    /// Requests the page of messages older than `before_ts` (microseconds).
    ///
    /// The page is merged before `completion` runs. Fails fast if the action
    /// loop is not running.
    pub fn request_history_before(
        &self,
        before_ts: i64,
        completion: impl FnOnce(ActionResult<HistoryPage>) + Send + 'static,
    ) -> ActionResult<()> {
        let provider = self.clone();
        self.requests.enqueue(
            before_request(before_ts)
                .on_complete(move |result| completion(provider.merge_before(result))),
        )
    }

    /// Requests every "since" page starting at `since` and merges them.
    ///
    /// `completion` receives the number of merged messages once the last
    /// page is in. If the loop stops part way through the chain it receives
    /// [`ActionError::Cancelled`]; pages merged so far stay merged.
    pub fn request_history_since(
        &self,
        since: Option<String>,
        completion: impl FnOnce(ActionResult<usize>) + Send + 'static,
    ) -> ActionResult<()> {
        let completion: SinceCallback = Box::new(completion);
        let slot: SinceCompletion = Arc::new(Mutex::new(Some(completion)));
        self.fetch_since(since, 0, slot)
    }

    fn fetch_since(
        &self,
        since: Option<String>,
        merged: usize,
        slot: SinceCompletion,
    ) -> ActionResult<()> {
        let provider = self.clone();
        let request = since_request(since.as_deref()).on_complete(move |result| {
            let page = match provider.merge_since(result) {
                Ok(page) => page,
                Err(e) => return finish(&slot, Err(e)),
            };
            let merged = merged + page.messages.len();
            if next_since(since.as_deref(), &page).is_none() {
                return finish(&slot, Ok(merged));
            }
            if let Err(e) = provider.fetch_since(page.revision, merged, Arc::clone(&slot)) {
                warn!(merged, "history since chain interrupted: {}", e);
                finish(&slot, Err(ActionError::Cancelled));
            }
        });
        self.requests.enqueue(request)
    }

    /// Fetches and merges the page older than `before_ts`.
    pub async fn history_before(&self, before_ts: i64) -> ActionResult<HistoryPage> {
        let result = self.requests.submit(before_request(before_ts)).await;
        self.merge_before(result)
    }

    /// Fetches and merges every "since" page after `since`. Returns the
    /// number of merged messages.
    pub async fn history_since(&self, mut since: Option<String>) -> ActionResult<usize> {
        let mut merged = 0;
        loop {
            let result = self.requests.submit(since_request(since.as_deref())).await;
            let page = self.merge_since(result)?;
            merged += page.messages.len();
            match next_since(since.as_deref(), &page) {
                Some(next) => since = Some(next.to_string()),
                None => return Ok(merged),
            }
        }
    }

    fn merge_before(&self, result: ActionResult<Value>) -> ActionResult<HistoryPage> {
        let page = decode_page(&result?)?;
        debug!(count = page.messages.len(), has_more = page.has_more, "history before page");
        self.storage
            .receive_history_before(page.messages.clone(), page.has_more);
        Ok(page)
    }

    fn merge_since(&self, result: ActionResult<Value>) -> ActionResult<HistoryPage> {
        let page = decode_page(&result?)?;
        debug!(count = page.messages.len(), has_more = page.has_more, revision = ?page.revision, "history since page");
        self.storage.receive_history_update(
            page.messages.clone(),
            &page.deleted,
            page.revision.clone(),
        );
        Ok(page)
    }
}

fn before_request(before_ts: i64) -> ActionRequest {
    ActionRequest::history().param(Parameter::BeforeTimestamp, before_ts)
}

fn since_request(since: Option<&str>) -> ActionRequest {
    let request = ActionRequest::history();
    match since {
        Some(revision) => request.param(Parameter::Since, revision),
        None => request,
    }
}

/// Returns the revision to continue from, if the chain should continue.
///
/// A page that claims more but does not advance the revision ends the
/// chain instead of looping on the same page.
fn next_since<'a>(since: Option<&str>, page: &'a HistoryPage) -> Option<&'a str> {
    if !page.has_more {
        return None;
    }
    let next = page.revision.as_deref()?;
    if Some(next) == since {
        warn!(revision = next, "history since page did not advance");
        return None;
    }
    Some(next)
}

fn decode_page(body: &Value) -> ActionResult<HistoryPage> {
    let decoded = HistoryPage::from_json(body).map_err(|e| match e {
        DecodeError::ServerError(code) => ActionError::Server(ServerErrorCode::from_wire(&code)),
        other => ActionError::MalformedResponse(other.to_string()),
    })?;
    for rejected in &decoded.rejected {
        warn!("skipping history message: {}", rejected);
    }
    Ok(decoded.value)
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
