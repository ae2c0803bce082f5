//! Chunk catalog manager: the config-server authority for chunk-range
//! ownership, committing split/merge/migrate atomically under a
//! per-namespace lock.

pub mod changelog;
pub mod chunk;
pub mod error;
pub mod history_sweep;
pub mod lock;
pub mod merge;
pub mod migrate_commit;
pub mod split;
pub mod store;

use crate::key::Key;
use crate::oid::OpaqueId;
use crate::range::ChunkRange;
use crate::retry::retry_transient;
use crate::version::ChunkVersion;
use changelog::ChangeLog;
use chunk::{Chunk, ShardId, Timestamp};
use error::Error;
use lock::ChunkOpLock;
use migrate_commit::MigrationCommitResult;
use std::sync::Arc;
use std::time::Duration;
use store::ChunkStore;

/// Delay between retries of a transient commit failure. Short because the
/// retry budget is meant to ride out a network blip, not a real outage.
const TRANSIENT_RETRY_BACKOFF: Duration = Duration::from_millis(50);

pub struct CatalogManager {
    store: Arc<dyn ChunkStore>,
    lock: ChunkOpLock,
    changelog: ChangeLog,
    history_retention_secs: u64,
    max_transient_retries: u32,
}

impl CatalogManager {
    pub fn new(store: Arc<dyn ChunkStore>, stripe_count: usize, history_retention_secs: u64) -> Self {
        Self::with_retry_budget(store, stripe_count, history_retention_secs, 0)
    }

    pub fn with_retry_budget(
        store: Arc<dyn ChunkStore>,
        stripe_count: usize,
        history_retention_secs: u64,
        max_transient_retries: u32,
    ) -> Self {
        Self {
            store,
            lock: ChunkOpLock::new(stripe_count),
            changelog: ChangeLog::new(),
            history_retention_secs,
            max_transient_retries,
        }
    }

    pub fn changelog(&self) -> &ChangeLog {
        &self.changelog
    }

    pub async fn split(
        &self,
        ns: &str,
        request_epoch: OpaqueId,
        range: &ChunkRange,
        split_points: &[Key],
        owning_shard: &ShardId,
        at: Timestamp,
    ) -> Result<Vec<Chunk>, Error> {
        let _guard = self.lock.acquire(ns).await;
        retry_transient(self.max_transient_retries, TRANSIENT_RETRY_BACKOFF, || async {
            split::split_commit(
                self.store.as_ref(),
                &self.changelog,
                ns,
                request_epoch,
                range,
                split_points,
                owning_shard,
                at,
            )
        })
        .await
    }

    pub async fn merge(
        &self,
        ns: &str,
        request_epoch: OpaqueId,
        boundaries: &[Key],
        owning_shard: &ShardId,
        valid_after: Option<Timestamp>,
        at: Timestamp,
    ) -> Result<Chunk, Error> {
        let _guard = self.lock.acquire(ns).await;
        retry_transient(self.max_transient_retries, TRANSIENT_RETRY_BACKOFF, || async {
            merge::merge_commit(
                self.store.as_ref(),
                &self.changelog,
                ns,
                request_epoch,
                boundaries,
                owning_shard,
                valid_after,
                at,
            )
        })
        .await
    }

    pub async fn commit_migration(
        &self,
        ns: &str,
        migrated_range: &ChunkRange,
        from_shard: &ShardId,
        to_shard: &ShardId,
        expected_epoch: OpaqueId,
        valid_after: Timestamp,
    ) -> Result<MigrationCommitResult, Error> {
        let _guard = self.lock.acquire(ns).await;
        retry_transient(self.max_transient_retries, TRANSIENT_RETRY_BACKOFF, || async {
            migrate_commit::migration_commit(
                self.store.as_ref(),
                &self.changelog,
                ns,
                migrated_range,
                from_shard,
                to_shard,
                expected_epoch,
                valid_after,
                self.history_retention_secs,
            )
        })
        .await
    }

    /// Seeds a brand-new collection with a single whole-range chunk under a
    /// fresh epoch (`_configsvrEnableSharding`). Idempotent: a namespace
    /// that already has chunks is left untouched and its first existing
    /// chunk is returned instead.
    pub async fn enable_sharding(&self, ns: &str, owning_shard: &ShardId, at: Timestamp) -> Result<Chunk, Error> {
        let _guard = self.lock.acquire(ns).await;

        if let Some(existing) = self.store.chunks(ns).into_iter().next() {
            return Ok(existing);
        }

        let epoch = OpaqueId::new();
        let chunk = Chunk::new(ns, ChunkRange::whole(), owning_shard.clone(), ChunkVersion::initial(epoch));
        self.store.compare_and_replace(ns, &[], vec![chunk.clone()])?;

        self.changelog.record(changelog::ChangeLogEntry {
            ns: ns.to_string(),
            kind: changelog::ChangeKind::EnableSharding,
            before: None,
            after: chunk.version,
            at,
        });

        Ok(chunk)
    }

    pub async fn history_upgrade(&self, ns: &str, at: Timestamp) -> Result<usize, Error> {
        let _guard = self.lock.acquire(ns).await;
        history_sweep::history_upgrade(self.store.as_ref(), &self.changelog, ns, at)
    }

    pub async fn history_downgrade(&self, ns: &str, at: Timestamp) -> Result<usize, Error> {
        let _guard = self.lock.acquire(ns).await;
        history_sweep::history_downgrade(self.store.as_ref(), &self.changelog, ns, at)
    }

    pub fn collection_version(&self, ns: &str) -> crate::version::ChunkVersion {
        self.store.collection_version(ns)
    }

    pub fn shard_version(&self, ns: &str, shard: &ShardId) -> crate::version::ChunkVersion {
        self.store.shard_version(ns, shard)
    }

    pub fn chunks(&self, ns: &str) -> Vec<Chunk> {
        self.store.chunks(ns)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::version::ChunkVersion;
    use std::sync::atomic::{AtomicU32, Ordering};
    use store::FakeChunkStore;

    /// Wraps a [`FakeChunkStore`] and fails the first `flaky_attempts` calls
    /// to `compare_and_replace` with a transient error before delegating.
    struct FlakyChunkStore {
        inner: FakeChunkStore,
        remaining_failures: AtomicU32,
    }

    impl FlakyChunkStore {
        fn new(flaky_attempts: u32) -> Self {
            Self {
                inner: FakeChunkStore::new(),
                remaining_failures: AtomicU32::new(flaky_attempts),
            }
        }

        fn seed(&self, ns: &str, chunks: Vec<Chunk>) {
            self.inner.seed(ns, chunks);
        }
    }

    impl store::ChunkStore for FlakyChunkStore {
        fn chunks(&self, ns: &str) -> Vec<Chunk> {
            self.inner.chunks(ns)
        }

        fn compare_and_replace(&self, ns: &str, expected: &[Chunk], replacement: Vec<Chunk>) -> Result<(), Error> {
            let remaining = self.remaining_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(Error::NetworkTimeout);
            }
            self.inner.compare_and_replace(ns, expected, replacement)
        }
    }

    #[tokio::test]
    async fn test_split_retries_through_transient_failures() {
        let store = Arc::new(FlakyChunkStore::new(2));
        let epoch = OpaqueId::new();
        store.seed(
            "db.coll",
            vec![Chunk::new(
                "db.coll",
                ChunkRange::new(Key::int(0), Key::int(100)).unwrap(),
                "A".to_string(),
                ChunkVersion::initial(epoch),
            )],
        );

        let manager = CatalogManager::with_retry_budget(store, 4, 10, 3);
        let result = manager
            .split(
                "db.coll",
                epoch,
                &ChunkRange::new(Key::int(0), Key::int(100)).unwrap(),
                &[Key::int(50)],
                &"A".to_string(),
                Timestamp(1),
            )
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_split_gives_up_when_retry_budget_is_exhausted() {
        let store = Arc::new(FlakyChunkStore::new(5));
        let epoch = OpaqueId::new();
        store.seed(
            "db.coll",
            vec![Chunk::new(
                "db.coll",
                ChunkRange::new(Key::int(0), Key::int(100)).unwrap(),
                "A".to_string(),
                ChunkVersion::initial(epoch),
            )],
        );

        let manager = CatalogManager::with_retry_budget(store, 4, 10, 2);
        let result = manager
            .split(
                "db.coll",
                epoch,
                &ChunkRange::new(Key::int(0), Key::int(100)).unwrap(),
                &[Key::int(50)],
                &"A".to_string(),
                Timestamp(1),
            )
            .await;
        assert!(matches!(result, Err(Error::NetworkTimeout)));
    }

    #[tokio::test]
    async fn test_split_commit_through_manager() {
        let store = Arc::new(FakeChunkStore::new());
        let epoch = OpaqueId::new();
        store.seed(
            "db.coll",
            vec![Chunk::new(
                "db.coll",
                ChunkRange::new(Key::int(0), Key::int(100)).unwrap(),
                "A".to_string(),
                ChunkVersion::initial(epoch),
            )],
        );

        let manager = CatalogManager::new(store, 4, 10);
        let result = manager
            .split(
                "db.coll",
                epoch,
                &ChunkRange::new(Key::int(0), Key::int(100)).unwrap(),
                &[Key::int(50)],
                &"A".to_string(),
                Timestamp(1),
            )
            .await
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(manager.collection_version("db.coll").minor, result[1].version.minor);
    }

    #[tokio::test]
    async fn test_enable_sharding_seeds_a_fresh_whole_range_chunk() {
        let store = Arc::new(FakeChunkStore::new());
        let manager = CatalogManager::new(store, 4, 10);
        let chunk = manager.enable_sharding("db.coll", &"A".to_string(), Timestamp(0)).await.unwrap();
        assert_eq!(chunk.range, ChunkRange::whole());
        assert_eq!(manager.collection_version("db.coll"), chunk.version);
    }

    #[tokio::test]
    async fn test_enable_sharding_is_idempotent() {
        let store = Arc::new(FakeChunkStore::new());
        let manager = CatalogManager::new(store, 4, 10);
        let first = manager.enable_sharding("db.coll", &"A".to_string(), Timestamp(0)).await.unwrap();
        let second = manager.enable_sharding("db.coll", &"B".to_string(), Timestamp(1)).await.unwrap();
        assert_eq!(first.version, second.version);
        assert_eq!(second.shard, "A");
    }
}
