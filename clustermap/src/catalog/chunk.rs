//! The persisted chunk record (`config.chunks`).

use crate::range::ChunkRange;
use crate::version::ChunkVersion;
use serde::{Deserialize, Serialize};

pub type ShardId = String;

/// Opaque timestamp used for chunk history ordering. A real deployment
/// would use a replication-cluster timestamp; a monotonically increasing
/// counter is sufficient for the ordering and retention invariants here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn saturating_sub_secs(&self, secs: u64) -> Timestamp {
        Timestamp(self.0.saturating_sub(secs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub valid_after: Timestamp,
    pub shard: ShardId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub ns: String,
    pub range: ChunkRange,
    pub shard: ShardId,
    pub version: ChunkVersion,
    pub jumbo: bool,
    /// Newest-first.
    pub history: Vec<HistoryEntry>,
    /// Bytes written to this chunk's range since the counter was last
    /// cleared. Not persisted to `config.chunks`; maintained in-memory as
    /// input to a future auto-split policy (not implemented here).
    #[serde(skip)]
    pub bytes_written: u64,
}

/// Equality used for commit preconditions: everything except the
/// in-memory-only `bytes_written` counter.
impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.ns == other.ns
            && self.range == other.range
            && self.shard == other.shard
            && self.version == other.version
            && self.jumbo == other.jumbo
            && self.history == other.history
    }
}
impl Eq for Chunk {}

impl Chunk {
    pub fn new(ns: impl Into<String>, range: ChunkRange, shard: ShardId, version: ChunkVersion) -> Self {
        Self {
            ns: ns.into(),
            range,
            shard,
            version,
            jumbo: false,
            history: Vec::new(),
            bytes_written: 0,
        }
    }

    pub fn add_bytes_written(&mut self, n: u64) {
        self.bytes_written = self.bytes_written.saturating_add(n);
    }

    pub fn clear_bytes_written(&mut self) {
        self.bytes_written = 0;
    }

    pub fn mark_jumbo(&mut self) {
        self.jumbo = true;
    }

    /// Prepend a new history entry, rejecting it if it's not strictly newer
    /// than the current newest entry (history must stay newest-first).
    pub fn prepend_history(&mut self, entry: HistoryEntry) -> Result<(), super::error::Error> {
        if let Some(front) = self.history.first() {
            if entry.valid_after <= front.valid_after {
                return Err(super::error::Error::HistoryOutOfOrder);
            }
        }
        self.history.insert(0, entry);
        Ok(())
    }

    /// Drop history entries older than `valid_after - retention`, keeping at
    /// least the newest entry.
    pub fn prune_history(&mut self, retention_secs: u64) {
        if self.history.len() <= 1 {
            return;
        }
        let cutoff = self.history[0].valid_after.saturating_sub_secs(retention_secs);
        self.history.truncate(
            self.history
                .iter()
                .position(|e| e.valid_after < cutoff)
                .unwrap_or(self.history.len()),
        );
    }
}
