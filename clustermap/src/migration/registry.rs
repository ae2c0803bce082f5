//! Tracks in-flight donor and recipient migrations by namespace so the
//! shard-targeted commands can resume an existing state machine instead of
//! each handler owning its own copy.
//!
//! Each collection on the donor, and each namespace on the recipient, has
//! at most one active migration; a keyed map enforces that
//! one-at-a-time-per-namespace constraint while still letting one process
//! act as donor or recipient for several collections concurrently.

use super::donor::DonorMigration;
use super::error::Error;
use super::recipient::RecipientMigration;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct MigrationRegistry {
    donors: Mutex<HashMap<String, DonorMigration>>,
    recipients: Mutex<HashMap<String, RecipientMigration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new donor-side migration for `ns`, failing if one is
    /// already in flight (only one at a time per collection is allowed).
    pub fn start_donor(&self, ns: &str, donor: DonorMigration) -> Result<(), Error> {
        let mut donors = self.donors.lock();
        if donors.contains_key(ns) {
            return Err(Error::Aborted {
                ns: ns.to_string(),
                reason: "a migration is already in flight for this namespace".into(),
            });
        }
        donors.insert(ns.to_string(), donor);
        Ok(())
    }

    pub fn with_donor<R>(&self, ns: &str, f: impl FnOnce(&mut DonorMigration) -> R) -> Option<R> {
        self.donors.lock().get_mut(ns).map(f)
    }

    pub fn remove_donor(&self, ns: &str) -> Option<DonorMigration> {
        self.donors.lock().remove(ns)
    }

    pub fn start_recipient(&self, ns: &str) {
        self.recipients
            .lock()
            .entry(ns.to_string())
            .or_insert_with(|| RecipientMigration::new(ns));
    }

    pub fn with_recipient<R>(&self, ns: &str, f: impl FnOnce(&mut RecipientMigration) -> R) -> Option<R> {
        self.recipients.lock().get_mut(ns).map(f)
    }

    pub fn remove_recipient(&self, ns: &str) -> Option<RecipientMigration> {
        self.recipients.lock().remove(ns)
    }

    pub fn has_active_donor(&self, ns: &str) -> bool {
        self.donors.lock().contains_key(ns)
    }
}
