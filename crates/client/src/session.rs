// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot session teardown.
//!
//! A [`SessionDestroyer`] is shared by every component of a session. It holds
//! the `destroyed` flag that guarded callbacks consult at delivery time and
//! the ordered list of teardown actions that run when the session ends.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::debug;

type Teardown = Box<dyn FnOnce() + Send>;

/// Teardown flag plus registered teardown callbacks for one session.
pub struct SessionDestroyer {
    key: String,
    destroyed: AtomicBool,
    callbacks: Mutex<Vec<Teardown>>,
}

impl SessionDestroyer {
    /// Creates a live session identified by `key`.
    ///
    /// The key namespaces everything the session persists, so two
    /// destroyers built with the same key refer to the same stored state.
    pub fn new(key: impl Into<String>) -> Self {
        SessionDestroyer {
            key: key.into(),
            destroyed: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Returns the stable session key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Registers a teardown action.
    ///
    /// If the session is already destroyed the action runs immediately on
    /// the calling thread.
    pub fn add(&self, callback: impl FnOnce() + Send + 'static) {
        let mut callbacks = self.callbacks.lock().unwrap_or_else(|e| e.into_inner());
        if self.is_destroyed() {
            drop(callbacks);
            callback();
            return;
        }
        callbacks.push(Box::new(callback));
    }

    /// Destroys the session.
    ///
    /// The first call runs every registered callback once, in registration
    /// order, and returns true. Later calls do nothing and return false.
    pub fn destroy(&self) -> bool {
        let callbacks = {
            let mut callbacks = self.callbacks.lock().unwrap_or_else(|e| e.into_inner());
            if self
                .destroyed
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
            std::mem::take(&mut *callbacks)
        };

        debug!(session = %self.key, teardown = callbacks.len(), "destroying session");
        for callback in callbacks {
            callback();
        }
        true
    }

    /// Returns true once [`destroy`](Self::destroy) has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SessionDestroyer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionDestroyer")
            .field("key", &self.key)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
