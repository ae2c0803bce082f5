//! Migration error taxonomy.

use crate::retry::Transient;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("migration for {ns:?} was aborted: {reason}")]
    Aborted { ns: String, reason: String },

    #[error("migration for {ns:?} is not in state {expected:?} (currently {actual:?})")]
    WrongState { ns: String, expected: &'static str, actual: &'static str },

    #[error("config-server commit for {ns:?} failed and the donor's refresh did not show the ownership change landing")]
    CommitUnconfirmed { ns: String },

    #[error(transparent)]
    Catalog(#[from] crate::catalog::error::Error),

    #[error("network timeout talking to the recipient")]
    NetworkTimeout,

    #[error("migration cancelled")]
    Interrupted,
}

impl Transient for Error {
    fn is_transient(&self) -> bool {
        matches!(self, Error::NetworkTimeout)
    }
}
