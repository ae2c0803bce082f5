//! The `config.chunks` abstraction: a trait plus an in-memory fake.
//!
//! Real commits go over a config-server RPC; tests and the in-process demo
//! drive the same algorithms against [`FakeChunkStore`] so the catalog
//! logic is exercised without a network dependency.

use super::chunk::{Chunk, ShardId};
use super::error::Error;
use crate::version::ChunkVersion;
use parking_lot::Mutex;
use std::collections::HashMap;

pub trait ChunkStore: Send + Sync {
    /// All chunks for `ns`, in no particular order.
    fn chunks(&self, ns: &str) -> Vec<Chunk>;

    /// The collection version: the max version across all of `ns`'s
    /// chunks, or `UNSHARDED` if there are none.
    fn collection_version(&self, ns: &str) -> ChunkVersion {
        self.chunks(ns)
            .iter()
            .map(|c| c.version)
            .max_by(|a, b| (a.major, a.minor).cmp(&(b.major, b.minor)))
            .unwrap_or(ChunkVersion::UNSHARDED)
    }

    /// The shard version: the max version across `ns`'s chunks owned by
    /// `shard`, or `UNSHARDED` if it owns none.
    fn shard_version(&self, ns: &str, shard: &ShardId) -> ChunkVersion {
        self.chunks(ns)
            .iter()
            .filter(|c| &c.shard == shard)
            .map(|c| c.version)
            .max_by(|a, b| (a.major, a.minor).cmp(&(b.major, b.minor)))
            .unwrap_or(ChunkVersion::UNSHARDED)
    }

    /// Atomically replace `expected` (matched by full value equality) with
    /// `replacement`. Fails with `IncompatibleShardingMetadata` if any
    /// expected row no longer matches.
    fn compare_and_replace(
        &self,
        ns: &str,
        expected: &[Chunk],
        replacement: Vec<Chunk>,
    ) -> Result<(), Error>;
}

#[derive(Default)]
pub struct FakeChunkStore {
    inner: Mutex<HashMap<String, Vec<Chunk>>>,
}

impl FakeChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, ns: &str, chunks: Vec<Chunk>) {
        self.inner.lock().insert(ns.to_string(), chunks);
    }
}

impl ChunkStore for FakeChunkStore {
    fn chunks(&self, ns: &str) -> Vec<Chunk> {
        self.inner.lock().get(ns).cloned().unwrap_or_default()
    }

    fn compare_and_replace(
        &self,
        ns: &str,
        expected: &[Chunk],
        replacement: Vec<Chunk>,
    ) -> Result<(), Error> {
        let mut guard = self.inner.lock();
        let current = guard.entry(ns.to_string()).or_default();

        for want in expected {
            if !current.iter().any(|have| have == want) {
                return Err(Error::IncompatibleShardingMetadata { ns: ns.to_string() });
            }
        }

        current.retain(|c| !expected.iter().any(|want| chunk_identity_eq(c, want)));
        current.extend(replacement);
        Ok(())
    }
}

fn chunk_identity_eq(a: &Chunk, b: &Chunk) -> bool {
    a.ns == b.ns && a.range == b.range
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::Key;
    use crate::oid::OpaqueId;
    use crate::range::ChunkRange;

    fn chunk(min: i64, max: i64, shard: &str, version: ChunkVersion) -> Chunk {
        Chunk::new(
            "db.coll",
            ChunkRange::new(Key::int(min), Key::int(max)).unwrap(),
            shard.to_string(),
            version,
        )
    }

    #[test]
    fn test_collection_version_is_max_across_chunks() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let v1 = ChunkVersion::initial(epoch);
        let v2 = v1.next_minor();
        store.seed("db.coll", vec![chunk(0, 5, "A", v1), chunk(5, 10, "A", v2)]);
        assert_eq!(store.collection_version("db.coll"), v2);
    }

    #[test]
    fn test_unsharded_when_no_chunks() {
        let store = FakeChunkStore::new();
        assert_eq!(store.collection_version("db.none"), ChunkVersion::UNSHARDED);
    }

    #[test]
    fn test_compare_and_replace_rejects_stale_precondition() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let v1 = ChunkVersion::initial(epoch);
        let original = chunk(0, 10, "A", v1);
        store.seed("db.coll", vec![original.clone()]);

        let mut stale_expected = original.clone();
        stale_expected.shard = "B".to_string();

        let result = store.compare_and_replace("db.coll", &[stale_expected], vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_compare_and_replace_swaps_matching_rows() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let v1 = ChunkVersion::initial(epoch);
        let original = chunk(0, 10, "A", v1);
        store.seed("db.coll", vec![original.clone()]);

        let replacement = chunk(0, 10, "A", v1.next_major());
        store
            .compare_and_replace("db.coll", &[original], vec![replacement.clone()])
            .unwrap();

        assert_eq!(store.chunks("db.coll"), vec![replacement]);
    }
}
