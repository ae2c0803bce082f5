//! The chunk-op lock: per-namespace striping over a single exclusive lock.
//!
//! A single process-wide exclusive lock per collection commit would be
//! correct but coarse. We refine that to a small stripe table keyed by
//! namespace hash, since the cost of a sharded lock table is negligible
//! next to the RPC latency it serializes against, and it avoids one
//! collection's commits blocking an unrelated collection's.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::{Mutex, MutexGuard};

pub struct ChunkOpLock {
    stripes: Vec<Mutex<()>>,
}

impl ChunkOpLock {
    pub fn new(stripe_count: usize) -> Self {
        assert!(stripe_count > 0, "stripe_count must be nonzero");
        Self {
            stripes: (0..stripe_count).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe_index(&self, ns: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        ns.hash(&mut hasher);
        (hasher.finish() as usize) % self.stripes.len()
    }

    pub async fn acquire(&self, ns: &str) -> MutexGuard<'_, ()> {
        self.stripes[self.stripe_index(ns)].lock().await
    }
}
