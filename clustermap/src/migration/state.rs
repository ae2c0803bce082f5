//! Migration state and the donor-side record.

use crate::catalog::chunk::ShardId;
use crate::host::Host;
use crate::range::ChunkRange;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type RecordId = String;
pub type SessionId = crate::oid::OpaqueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Created,
    Cloning,
    CloneCaughtUp,
    CriticalSection,
    CloneCompleted,
    Done,
}

impl State {
    /// The states in which a command targeting this chunk's range is
    /// rejected with "migration commit in progress".
    pub fn blocks_writes(self) -> bool {
        matches!(self, State::CriticalSection)
    }
}

/// Donor-side bookkeeping for one in-flight migration.
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub ns: String,
    pub range: ChunkRange,
    pub from_shard: ShardId,
    pub to_shard: ShardId,
    pub session_id: SessionId,
    pub state: State,
    pub cloned_record_ids: HashSet<RecordId>,
    pub pending_reload: Vec<RecordId>,
    pub pending_delete: Vec<RecordId>,
    pub memory_used: usize,
    pub recipient_host: Host,
}

impl MigrationRecord {
    pub fn new(
        ns: impl Into<String>,
        range: ChunkRange,
        from_shard: ShardId,
        to_shard: ShardId,
        recipient_host: Host,
    ) -> Self {
        Self {
            ns: ns.into(),
            range,
            from_shard,
            to_shard,
            session_id: SessionId::new(),
            state: State::Created,
            cloned_record_ids: HashSet::new(),
            pending_reload: Vec::new(),
            pending_delete: Vec::new(),
            memory_used: 0,
            recipient_host,
        }
    }

    /// True once both the reload and delete backlogs have drained and no
    /// tracked record remains un-acked by the recipient.
    pub fn caught_up(&self) -> bool {
        self.pending_reload.is_empty() && self.pending_delete.is_empty()
    }

    pub fn record_write(&mut self, id: RecordId, deleted: bool, estimated_bytes: usize) {
        if deleted {
            self.pending_delete.push(id);
        } else {
            self.pending_reload.push(id);
        }
        self.memory_used += estimated_bytes;
    }

    pub fn drain_reload_batch(&mut self, max_bytes: usize, avg_record_bytes: usize) -> Vec<RecordId> {
        drain_batch(&mut self.pending_reload, max_bytes, avg_record_bytes)
    }

    pub fn drain_delete_batch(&mut self, max_bytes: usize, avg_record_bytes: usize) -> Vec<RecordId> {
        drain_batch(&mut self.pending_delete, max_bytes, avg_record_bytes)
    }
}

fn drain_batch(queue: &mut Vec<RecordId>, max_bytes: usize, avg_record_bytes: usize) -> Vec<RecordId> {
    let count = if avg_record_bytes == 0 {
        queue.len()
    } else {
        (max_bytes / avg_record_bytes).max(1).min(queue.len())
    };
    queue.drain(..count).collect()
}
