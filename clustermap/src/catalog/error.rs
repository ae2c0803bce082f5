//! Catalog manager error taxonomy.

use crate::oid::OpaqueId;
use crate::retry::Transient;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("namespace {ns:?}: request epoch {requested} does not match collection epoch {current}")]
    StaleEpoch {
        ns: String,
        requested: OpaqueId,
        current: OpaqueId,
    },

    #[error("namespace {ns:?}: commit precondition no longer matches stored chunk state")]
    IncompatibleShardingMetadata { ns: String },

    #[error("split requires at least one split point")]
    NoSplitPoints,

    #[error("split point must lie strictly inside the target range")]
    InvalidSplitPoint,

    #[error("merge requires at least two chunk boundaries")]
    TooFewMergeBoundaries,

    #[error("history entries must be strictly increasing by validAfter")]
    HistoryOutOfOrder,

    #[error("namespace {0:?} is not sharded")]
    NamespaceNotFound(String),

    #[error("config-server RPC timed out")]
    NetworkTimeout,

    #[error(transparent)]
    InvalidRange(#[from] crate::range::InvalidRangeError),
}

impl Transient for Error {
    fn is_transient(&self) -> bool {
        matches!(self, Error::NetworkTimeout)
    }
}
