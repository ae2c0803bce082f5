//! Routing cache errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("namespace {0:?} has no chunks (not sharded, or not yet created)")]
    NamespaceNotSharded(String),

    #[error("namespace {0:?} chunks span more than one epoch")]
    MixedEpochs(String),

    #[error("namespace {0:?} chunk ranges have a gap or overlap")]
    GapOrOverlap(String),
}
