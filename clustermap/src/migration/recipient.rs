//! Recipient-side migration state machine: pulls the initial clone batch,
//! then mod batches, until it matches the donor's backlog.

use super::error::Error;
use super::state::RecordId;
use std::collections::HashSet;

/// Batches pulled from the donor are capped so a single serialized batch
/// never exceeds this size (16 MiB default — the actual cap is
/// configuration-driven; this is just the hard ceiling).
pub const MAX_BATCH_BYTES: usize = 16 * 1024 * 1024;

pub struct RecipientMigration {
    ns: String,
    applied_ids: HashSet<RecordId>,
    applied_reload_count: usize,
    applied_delete_count: usize,
    committed: bool,
}

impl RecipientMigration {
    pub fn new(ns: impl Into<String>) -> Self {
        Self {
            ns: ns.into(),
            applied_ids: HashSet::new(),
            applied_reload_count: 0,
            applied_delete_count: 0,
            committed: false,
        }
    }

    /// Apply the donor's initial snapshot batch.
    pub fn apply_initial_batch(&mut self, ids: Vec<RecordId>) {
        self.applied_ids.extend(ids);
    }

    /// Apply one mod batch pulled via `_transferMods`/`_migrateClone`.
    pub fn apply_mod_batch(&mut self, reloads: Vec<RecordId>, deletes: Vec<RecordId>) {
        self.applied_reload_count += reloads.len();
        for id in reloads {
            self.applied_ids.insert(id);
        }
        self.applied_delete_count += deletes.len();
        for id in deletes {
            self.applied_ids.remove(&id);
        }
    }

    pub fn applied_record_count(&self) -> usize {
        self.applied_ids.len()
    }

    /// Acknowledge the final tail so the donor can proceed to
    /// `commitChunkOnRecipient`. Recipient commit always happens before
    /// config-server commit.
    pub fn commit(&mut self) -> Result<(), Error> {
        if self.committed {
            return Err(Error::WrongState { ns: self.ns.clone(), expected: "not yet committed", actual: "committed" });
        }
        self.committed = true;
        Ok(())
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }
}
