use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the chunk migration donor/recipient state machines and the
/// shard-version check's critical-section wait.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Migration {
    /// How long a shard-version check blocks on an active critical-section
    /// signal before returning a stale-config error.
    ///
    /// _Default:_ `10000` (10s)
    #[serde(default = "Migration::critical_section_wait_ms")]
    pub critical_section_wait_ms: u64,

    /// Maximum serialized size of one clone/mod batch pulled by the recipient.
    ///
    /// _Default:_ `16777216` (16 MiB)
    #[serde(default = "Migration::max_batch_bytes")]
    pub max_batch_bytes: usize,

    /// Whether `moveChunk` waits for the donor's post-migration range
    /// deletion to be majority write-concern replicated before returning.
    ///
    /// _Default:_ `false`
    #[serde(default)]
    pub wait_for_delete: bool,
}

impl Migration {
    fn critical_section_wait_ms() -> u64 {
        10_000
    }

    fn max_batch_bytes() -> usize {
        16 * 1024 * 1024
    }

    pub fn critical_section_wait(&self) -> Duration {
        Duration::from_millis(self.critical_section_wait_ms)
    }
}

impl Default for Migration {
    fn default() -> Self {
        Self {
            critical_section_wait_ms: Self::critical_section_wait_ms(),
            max_batch_bytes: Self::max_batch_bytes(),
            wait_for_delete: false,
        }
    }
}
