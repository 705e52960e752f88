// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of pushed delta batches.
//!
//! A background task drains the transport's delta feed, applies each batch
//! through the [`DeltaCallback`] and hands the outcome to a listener on the
//! guarded executor, so listeners never run after the session is destroyed.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use cs_core::DeltaResponse;

use crate::delta::{ApplyOutcome, DeltaCallback};
use crate::executor::GuardedCallbackExecutor;

/// Receives the outcome of every batch that reached the callback.
pub type ApplyListener = Arc<dyn Fn(ApplyOutcome) + Send + Sync>;

/// Handle of the delta delivery task. Dropping it stops delivery.
pub struct DeltaFeed {
    task: JoinHandle<()>,
}

impl DeltaFeed {
    /// Spawns the delivery task on the current runtime.
    pub fn spawn(
        feed: mpsc::UnboundedReceiver<Value>,
        callback: Arc<DeltaCallback>,
        executor: GuardedCallbackExecutor,
        listener: ApplyListener,
    ) -> Self {
        let task = tokio::spawn(deliver(feed, callback, executor, listener));
        DeltaFeed { task }
    }

    /// Stops delivery. Batches not yet applied are dropped.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DeltaFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn deliver(
    mut feed: mpsc::UnboundedReceiver<Value>,
    callback: Arc<DeltaCallback>,
    executor: GuardedCallbackExecutor,
    listener: ApplyListener,
) {
    while let Some(raw) = feed.recv().await {
        if executor.destroyer().is_destroyed() {
            break;
        }
        let Some(outcome) = ingest(&callback, &raw) else {
            continue;
        };
        let listener = Arc::clone(&listener);
        executor.execute(move || listener(outcome));
    }
    debug!("delta feed closed");
}

/// Decodes and applies one pushed batch.
///
/// A push without a usable envelope is dropped; malformed deltas inside an
/// otherwise valid batch are skipped individually.
pub(crate) fn ingest(callback: &DeltaCallback, raw: &Value) -> Option<ApplyOutcome> {
    let decoded = match DeltaResponse::from_json(raw) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("dropping delta batch: {}", e);
            return None;
        }
    };
    for rejected in &decoded.rejected {
        warn!("skipping malformed delta: {}", rejected);
    }
    Some(callback.apply(decoded.value))
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
