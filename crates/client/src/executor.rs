// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Completion delivery that goes quiet once the session is destroyed.
//!
//! Every [`GuardedCallbackExecutor`] owns one delivery task. Callbacks are
//! delivered in the order they were scheduled; the destroyed flag is checked
//! again right before each one runs, so a destroy that lands between
//! scheduling and delivery still suppresses it.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use crate::session::SessionDestroyer;

type Job = Box<dyn FnOnce() + Send>;

enum Delivery {
    Run(Job),
    Flush(oneshot::Sender<()>),
}

/// Runs callbacks on a dedicated delivery task unless the session is gone.
///
/// Cloning yields another handle onto the same delivery task.
#[derive(Clone)]
pub struct GuardedCallbackExecutor {
    destroyer: Arc<SessionDestroyer>,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl GuardedCallbackExecutor {
    /// Creates an executor and spawns its delivery task.
    ///
    /// Must be called from within a tokio runtime. The task exits when the
    /// last handle is dropped.
    pub fn new(destroyer: Arc<SessionDestroyer>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(deliver(Arc::clone(&destroyer), rx));
        GuardedCallbackExecutor { destroyer, tx }
    }

    /// Schedules `callback` for delivery.
    ///
    /// Returns false if the callback was dropped without being scheduled
    /// (session already destroyed or delivery task gone).
    pub fn execute(&self, callback: impl FnOnce() + Send + 'static) -> bool {
        if self.destroyer.is_destroyed() {
            trace!(session = %self.destroyer.key(), "session destroyed, dropping callback");
            return false;
        }
        self.tx.send(Delivery::Run(Box::new(callback))).is_ok()
    }

    /// Waits until everything scheduled before this call has been delivered
    /// or suppressed.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Delivery::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    pub fn destroyer(&self) -> &Arc<SessionDestroyer> {
        &self.destroyer
    }
}

async fn deliver(destroyer: Arc<SessionDestroyer>, mut rx: mpsc::UnboundedReceiver<Delivery>) {
    while let Some(delivery) = rx.recv().await {
        match delivery {
            Delivery::Run(job) if destroyer.is_destroyed() => {
                trace!(session = %destroyer.key(), "session destroyed, suppressing callback");
                drop(job);
            }
            Delivery::Run(job) => job(),
            Delivery::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
