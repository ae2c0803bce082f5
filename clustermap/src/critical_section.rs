//! The critical-section signal shared between a migration donor and the
//! shard-version check: while a donor holds it, version checks on the
//! affected namespace fail fast instead of racing the commit.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Tracks, per namespace, whether a donor migration currently holds the
/// critical section, and lets waiters block on its release.
#[derive(Default)]
pub struct CriticalSectionRegistry {
    active: Mutex<HashMap<String, Arc<Notify>>>,
}

impl CriticalSectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, ns: &str) {
        self.active.lock().entry(ns.to_string()).or_insert_with(|| Arc::new(Notify::new()));
    }

    /// Release the critical section and wake any blocked shard-version
    /// checks so they can retry.
    pub fn exit(&self, ns: &str) {
        if let Some(notify) = self.active.lock().remove(ns) {
            notify.notify_waiters();
        }
    }

    pub fn is_active(&self, ns: &str) -> bool {
        self.active.lock().contains_key(ns)
    }

    /// Wait up to `timeout` for the namespace's critical section to clear.
    /// Returns `true` if it cleared, `false` on timeout.
    pub async fn wait_for_exit(&self, ns: &str, timeout: Duration) -> bool {
        let notify = match self.active.lock().get(ns).cloned() {
            Some(notify) => notify,
            None => return true,
        };
        tokio::time::timeout(timeout, notify.notified()).await.is_ok()
    }
}
