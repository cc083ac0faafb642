//! Identifier generation for projects and nodes.

use std::sync::atomic::{AtomicI64, Ordering};

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

/// Fresh project id (UUID v4, hyphenated).
///
/// Uses the OS RNG when it is available and otherwise falls back to a
/// time-seeded pseudo-random generator; the version/variant bits are set
/// either way.
pub fn new_project_id() -> String {
    let mut bytes = [0u8; 16];
    if let Err(e) = OsRng.try_fill_bytes(&mut bytes) {
        tracing::warn!(error = %e, "OS RNG unavailable, using pseudo-random project id");
        let seed = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default() as u64;
        StdRng::seed_from_u64(seed).fill_bytes(&mut bytes);
    }
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}

/// Hands out `node-{millis}` ids that never repeat within a process, even
/// when several nodes are created in the same millisecond.
#[derive(Debug, Default)]
pub struct NodeIdGenerator {
    last: AtomicI64,
}

impl NodeIdGenerator {
    pub const fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    pub fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return format!("node-{candidate}"),
                Err(actual) => prev = actual,
            }
        }
    }
}
