//! Crate-wide error, aggregating each module's error enum the way a
//! layered proxy composes its frontend error over its backend error.

use crate::retry::Transient;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Monitor(#[from] crate::monitor::Error),

    #[error(transparent)]
    Registry(#[from] crate::registry::Error),

    #[error(transparent)]
    Catalog(#[from] crate::catalog::error::Error),

    #[error(transparent)]
    Routing(#[from] crate::routing::error::Error),

    #[error(transparent)]
    Migration(#[from] crate::migration::Error),

    #[error(transparent)]
    ShardVersion(#[from] crate::shard_version::Error),

    #[error(transparent)]
    Config(#[from] clustermap_config::Error),
}

impl Transient for Error {
    fn is_transient(&self) -> bool {
        match self {
            Error::Catalog(e) => e.is_transient(),
            Error::Migration(e) => e.is_transient(),
            _ => false,
        }
    }
}
