//! Donor-side migration state machine.

use super::error::Error;
use super::state::{MigrationRecord, State};
use crate::catalog::chunk::Timestamp;
use crate::catalog::migrate_commit::MigrationCommitResult;
use crate::catalog::CatalogManager;
use crate::critical_section::CriticalSectionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

pub struct DonorMigration {
    pub record: MigrationRecord,
    catalog: Arc<CatalogManager>,
    critical_sections: Arc<CriticalSectionRegistry>,
    range_deleted: Arc<Notify>,
}

impl DonorMigration {
    pub fn new(
        record: MigrationRecord,
        catalog: Arc<CatalogManager>,
        critical_sections: Arc<CriticalSectionRegistry>,
    ) -> Self {
        Self {
            record,
            catalog,
            critical_sections,
            range_deleted: Arc::new(Notify::new()),
        }
    }

    fn require_state(&self, expected: State, name: &'static str) -> Result<(), Error> {
        if self.record.state != expected {
            return Err(Error::WrongState {
                ns: self.record.ns.clone(),
                expected: name,
                actual: state_name(self.record.state),
            });
        }
        Ok(())
    }

    /// kCreated -> kCloning: tell the recipient to begin pulling.
    pub fn start_clone(&mut self) -> Result<(), Error> {
        self.require_state(State::Created, "Created")?;
        self.record.state = State::Cloning;
        info!(ns = %self.record.ns, "migration entering Cloning");
        Ok(())
    }

    /// kCloning -> kCloneCaughtUp: recipient reports it consumed the
    /// initial batch and current mod log.
    pub fn await_catch_up(&mut self) -> Result<(), Error> {
        self.require_state(State::Cloning, "Cloning")?;
        if !self.record.caught_up() {
            return Err(Error::WrongState {
                ns: self.record.ns.clone(),
                expected: "reload/delete backlog drained",
                actual: "backlog pending",
            });
        }
        self.record.state = State::CloneCaughtUp;
        Ok(())
    }

    /// kCloneCaughtUp -> kCriticalSection: donor stops accepting writes to
    /// the range and flushes the last mods.
    pub fn enter_critical_section(&mut self) -> Result<(), Error> {
        self.require_state(State::CloneCaughtUp, "CloneCaughtUp")?;
        self.critical_sections.enter(&self.record.ns);
        self.record.state = State::CriticalSection;
        warn!(ns = %self.record.ns, "entering critical section, writes blocked");
        Ok(())
    }

    /// kCriticalSection -> kCloneCompleted: recipient has applied the
    /// final tail (caller confirms this out of band, e.g. via RPC ack).
    pub fn commit_on_recipient(&mut self, recipient_acked: bool) -> Result<(), Error> {
        self.require_state(State::CriticalSection, "CriticalSection")?;
        if !recipient_acked {
            return Err(Error::Aborted {
                ns: self.record.ns.clone(),
                reason: "recipient did not acknowledge final tail".into(),
            });
        }
        self.record.state = State::CloneCompleted;
        Ok(())
    }

    /// kCloneCompleted -> kDone: config-server commit. Ownership is never
    /// inferred from the recipient alone — only this call, or a later
    /// refresh that shows it landed, establishes success.
    pub async fn commit_on_config(&mut self, valid_after: Timestamp) -> Result<MigrationCommitResult, Error> {
        self.require_state(State::CloneCompleted, "CloneCompleted")?;

        let expected_epoch = self.catalog.collection_version(&self.record.ns).epoch;
        let result = self
            .catalog
            .commit_migration(
                &self.record.ns,
                &self.record.range,
                &self.record.from_shard,
                &self.record.to_shard,
                expected_epoch,
                valid_after,
            )
            .await;

        match result {
            Ok(commit) => {
                self.critical_sections.exit(&self.record.ns);
                self.record.state = State::Done;
                Ok(commit)
            }
            Err(catalog_err) => {
                // The commit's network leg may have failed after landing.
                // Re-read the collection's view before declaring failure.
                let landed = self
                    .catalog
                    .chunks(&self.record.ns)
                    .into_iter()
                    .find(|c| c.range == self.record.range && c.shard == self.record.to_shard);

                if let Some(migrated) = landed {
                    info!(ns = %self.record.ns, "config commit landed despite RPC error; treating as success");
                    self.critical_sections.exit(&self.record.ns);
                    self.record.state = State::Done;
                    let control = self
                        .catalog
                        .chunks(&self.record.ns)
                        .into_iter()
                        .find(|c| c.shard == self.record.from_shard);
                    return Ok(MigrationCommitResult { migrated, control });
                }

                self.cleanup(format!("config commit failed: {catalog_err}"));
                Err(Error::Catalog(catalog_err))
            }
        }
    }

    /// Wait for the post-migration range deletion to complete (`waitForDelete`).
    pub async fn wait_for_delete(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.range_deleted.notified()).await.is_ok()
    }

    pub fn signal_range_deleted(&self) {
        self.range_deleted.notify_waiters();
    }

    /// Move to kDone on any failure path: deregister the cloner, release
    /// the critical section if held, and leave a change-log trail.
    pub fn cleanup(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.record.state == State::CriticalSection {
            self.critical_sections.exit(&self.record.ns);
        }
        warn!(ns = %self.record.ns, reason, "migration cleanup, aborting");
        self.record.state = State::Done;
    }
}

fn state_name(state: State) -> &'static str {
    match state {
        State::Created => "Created",
        State::Cloning => "Cloning",
        State::CloneCaughtUp => "CloneCaughtUp",
        State::CriticalSection => "CriticalSection",
        State::CloneCompleted => "CloneCompleted",
        State::Done => "Done",
    }
}
