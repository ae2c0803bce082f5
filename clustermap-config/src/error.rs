use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("TOML parse error in \"{0}\": {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("history_retention_ms must be greater than zero")]
    ZeroHistoryRetention,

    #[error("chunk_op_lock_stripes must be greater than zero")]
    ZeroLockStripes,
}
