//! Errors surfaced by the replica-set monitor.

use crate::host::Host;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No up host satisfied the read preference after a completed scan;
    /// the caller retries a refresh.
    #[error("no host in replica set {set_name:?} satisfies the read preference")]
    Empty { set_name: String },

    #[error("host {0} is not a known member of the replica set")]
    UnknownHost(Host),
}
