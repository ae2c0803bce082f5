use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::Error;

/// Settings for the chunk catalog manager: chunk-op lock behavior and chunk
/// history retention.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    /// Number of stripes the chunk-op lock is split into. `1` reproduces a
    /// single process-wide exclusive lock; values above `1` stripe the lock
    /// by namespace hash, so unrelated collections don't serialize against
    /// each other.
    ///
    /// _Default:_ `16`
    #[serde(default = "Catalog::chunk_op_lock_stripes")]
    pub chunk_op_lock_stripes: usize,

    /// How far back `history` entries are retained on a migration commit,
    /// relative to the commit's `validAfter`.
    ///
    /// _Default:_ `10000` (10s)
    #[serde(default = "Catalog::history_retention_ms")]
    pub history_retention_ms: u64,

    /// Maximum number of transient (network-class) retries a single commit
    /// attempt performs before surfacing its last error to the caller.
    ///
    /// _Default:_ `3`
    #[serde(default = "Catalog::max_transient_retries")]
    pub max_transient_retries: u32,
}

impl Catalog {
    fn chunk_op_lock_stripes() -> usize {
        16
    }

    fn history_retention_ms() -> u64 {
        10_000
    }

    fn max_transient_retries() -> u32 {
        3
    }

    pub fn history_retention(&self) -> Duration {
        Duration::from_millis(self.history_retention_ms)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_op_lock_stripes == 0 {
            return Err(Error::ZeroLockStripes);
        }
        if self.history_retention_ms == 0 {
            return Err(Error::ZeroHistoryRetention);
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            chunk_op_lock_stripes: Self::chunk_op_lock_stripes(),
            history_retention_ms: Self::history_retention_ms(),
            max_transient_retries: Self::max_transient_retries(),
        }
    }
}
