// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message history: the shared timeline and the remote pager that fills it.

mod provider;
mod storage;

pub use provider::RemoteHistoryProvider;
pub use storage::{HistoryStorage, MemoryHistoryStorage};
