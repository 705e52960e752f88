// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

/// Length of a client-side id in hex characters.
pub const CLIENT_SIDE_ID_LEN: usize = 32;

/// Generates client-side message ids.
///
/// Format: first 32 hex chars of SHA256(seed + sequence + timestamp). The
/// seed is normally the session key so ids from different sessions do not
/// collide even when sent in the same microsecond.
#[derive(Debug)]
pub struct ClientSideIdGenerator {
    seed: String,
    sequence: AtomicU64,
}

impl ClientSideIdGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        ClientSideIdGenerator {
            seed: seed.into(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Returns a fresh id. Successive calls never repeat within one generator.
    pub fn next_id(&self, now_micros: i64) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        generate_client_side_id(&self.seed, sequence, now_micros)
    }
}

/// Hashes the inputs of a client-side id.
pub fn generate_client_side_id(seed: &str, sequence: u64, now_micros: i64) -> String {
    let input = format!("{seed}:{sequence}:{now_micros}");
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(&hash[..CLIENT_SIDE_ID_LEN / 2])
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
