//! Chunk versioning: the `(epoch, major, minor)` triple that orders chunk
//! placement changes within a collection's lifetime.

use crate::oid::OpaqueId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A chunk version. Ordering is only meaningful between two versions that
/// share an `epoch`; versions from different epochs are incomparable and
/// callers must check `same_epoch` before trusting a `<`/`>` result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChunkVersion {
    pub epoch: OpaqueId,
    pub major: u32,
    pub minor: u32,
}

impl ChunkVersion {
    /// Sentinel meaning "this collection is not sharded".
    pub const UNSHARDED: ChunkVersion = ChunkVersion {
        epoch: OpaqueId::ZERO,
        major: 0,
        minor: 0,
    };

    /// Sentinel meaning "skip the shard-version check entirely".
    pub const IGNORED: ChunkVersion = ChunkVersion {
        epoch: OpaqueId::ZERO,
        major: 0,
        minor: 1,
    };

    pub fn new(epoch: OpaqueId, major: u32, minor: u32) -> Self {
        Self { epoch, major, minor }
    }

    /// First version minted for a freshly created epoch.
    pub fn initial(epoch: OpaqueId) -> Self {
        Self::new(epoch, 1, 0)
    }

    /// Whether this version represents an actual sharded placement, as
    /// opposed to the `UNSHARDED` sentinel.
    pub fn is_set(&self) -> bool {
        *self != Self::UNSHARDED
    }

    pub fn same_epoch(&self, other: &Self) -> bool {
        self.epoch == other.epoch
    }

    /// Bump the major component, resetting minor to zero. Used when a
    /// migration moves a chunk to a different shard.
    pub fn next_major(&self) -> Self {
        Self::new(self.epoch, self.major + 1, 0)
    }

    /// Bump the minor component. Used for split/merge bookkeeping within the
    /// same placement generation.
    pub fn next_minor(&self) -> Self {
        Self::new(self.epoch, self.major, self.minor + 1)
    }

    /// Start a brand-new epoch, as happens when a collection is dropped and
    /// resharded under the same namespace.
    pub fn new_epoch(&self) -> Self {
        Self::initial(OpaqueId::new())
    }

    /// Ordering within a shared epoch only; `None` across epochs.
    pub fn partial_cmp_within_epoch(&self, other: &Self) -> Option<Ordering> {
        if !self.same_epoch(other) {
            return None;
        }
        Some((self.major, self.minor).cmp(&(other.major, other.minor)))
    }
}

impl fmt::Display for ChunkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}||{}", self.major, self.minor, self.epoch)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initial_version() {
        let epoch = OpaqueId::new();
        let v = ChunkVersion::initial(epoch);
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 0);
    }

    #[test]
    fn test_next_major_resets_minor() {
        let v = ChunkVersion::initial(OpaqueId::new()).next_minor().next_minor();
        assert_eq!(v.minor, 2);
        let bumped = v.next_major();
        assert_eq!(bumped.major, v.major + 1);
        assert_eq!(bumped.minor, 0);
    }

    #[test]
    fn test_ordering_requires_same_epoch() {
        let a = ChunkVersion::initial(OpaqueId::new());
        let b = a.next_minor();
        assert_eq!(a.partial_cmp_within_epoch(&b), Some(Ordering::Less));

        let c = ChunkVersion::initial(OpaqueId::new());
        assert_eq!(a.partial_cmp_within_epoch(&c), None);
    }

    #[test]
    fn test_new_epoch_resets_generation() {
        let v = ChunkVersion::initial(OpaqueId::new()).next_major().next_minor();
        let reset = v.new_epoch();
        assert!(!reset.same_epoch(&v));
        assert_eq!(reset.major, 1);
        assert_eq!(reset.minor, 0);
    }

    #[test]
    fn test_sentinels_are_distinct() {
        assert_ne!(ChunkVersion::UNSHARDED, ChunkVersion::IGNORED);
    }
}
