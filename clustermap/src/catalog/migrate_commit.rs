//! Config-server side of a migration commit, applied after commit ordering
//! has put the recipient's half of the state ahead of it.
//!
//! This is the atomic metadata flip once the recipient has already
//! committed its half; the donor/recipient state machine that drives up to
//! this point lives in the `migration` module.

use super::changelog::{ChangeKind, ChangeLog, ChangeLogEntry};
use super::chunk::{Chunk, HistoryEntry, ShardId, Timestamp};
use super::error::Error;
use super::store::ChunkStore;
use crate::oid::OpaqueId;
use crate::range::ChunkRange;
use crate::version::ChunkVersion;

pub struct MigrationCommitResult {
    pub migrated: Chunk,
    pub control: Option<Chunk>,
}

pub fn migration_commit(
    store: &dyn ChunkStore,
    changelog: &ChangeLog,
    ns: &str,
    migrated_range: &ChunkRange,
    from_shard: &ShardId,
    to_shard: &ShardId,
    expected_epoch: OpaqueId,
    valid_after: Timestamp,
    history_retention_secs: u64,
) -> Result<MigrationCommitResult, Error> {
    let collection_version = store.collection_version(ns);
    if collection_version.epoch != expected_epoch {
        return Err(Error::StaleEpoch {
            ns: ns.to_string(),
            requested: expected_epoch,
            current: collection_version.epoch,
        });
    }

    let existing = store.chunks(ns);
    let migrated_original = existing
        .iter()
        .find(|c| &c.range == migrated_range && &c.shard == from_shard)
        .cloned()
        .ok_or_else(|| Error::IncompatibleShardingMetadata { ns: ns.to_string() })?;

    let control_original = existing
        .iter()
        .find(|c| &c.shard == from_shard && &c.range != migrated_range)
        .cloned();

    let new_major = collection_version.major + 1;

    let mut migrated = migrated_original.clone();
    migrated.shard = to_shard.clone();
    migrated.version = ChunkVersion::new(expected_epoch, new_major, 0);
    migrated.prepend_history(HistoryEntry {
        valid_after,
        shard: to_shard.clone(),
    })?;
    migrated.prune_history(history_retention_secs);

    let (expected, mut replacement) = match &control_original {
        Some(control) => {
            let mut new_control = control.clone();
            new_control.version = ChunkVersion::new(expected_epoch, new_major, 1);
            (
                vec![migrated_original.clone(), control.clone()],
                vec![migrated.clone(), new_control],
            )
        }
        None => (vec![migrated_original.clone()], vec![migrated.clone()]),
    };

    store.compare_and_replace(ns, &expected, std::mem::take(&mut replacement))?;

    let control = store
        .chunks(ns)
        .into_iter()
        .find(|c| control_original.as_ref().is_some_and(|orig| orig.range == c.range));

    changelog.record(ChangeLogEntry {
        ns: ns.to_string(),
        kind: ChangeKind::Migrate,
        before: Some(collection_version),
        after: migrated.version,
        at: valid_after,
    });

    Ok(MigrationCommitResult { migrated, control })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::store::FakeChunkStore;
    use crate::key::Key;

    #[test]
    fn test_migration_commit_co_bumps_control_chunk() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let v = ChunkVersion::new(epoch, 7, 2);
        let migrated_range = ChunkRange::new(Key::int(50), Key::int(60)).unwrap();
        let control_range = ChunkRange::new(Key::int(60), Key::int(70)).unwrap();
        store.seed(
            "db.coll",
            vec![
                Chunk::new("db.coll", migrated_range.clone(), "A".into(), v),
                Chunk::new("db.coll", control_range.clone(), "A".into(), ChunkVersion::new(epoch, 7, 1)),
            ],
        );

        let log = ChangeLog::new();
        let result = migration_commit(
            &store,
            &log,
            "db.coll",
            &migrated_range,
            &"A".to_string(),
            &"B".to_string(),
            epoch,
            Timestamp(100),
            10,
        )
        .unwrap();

        assert_eq!(result.migrated.shard, "B");
        assert_eq!(result.migrated.version, ChunkVersion::new(epoch, 8, 0));
        assert_eq!(result.control.unwrap().version, ChunkVersion::new(epoch, 8, 1));

        let stored = store.chunks("db.coll");
        assert!(stored.iter().any(|c| c.range == migrated_range && c.shard == "B"));
        assert!(stored.iter().any(|c| c.range == control_range && c.shard == "A"));
    }

    #[test]
    fn test_migration_commit_without_control_chunk() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let migrated_range = ChunkRange::new(Key::int(0), Key::int(100)).unwrap();
        store.seed(
            "db.coll",
            vec![Chunk::new("db.coll", migrated_range.clone(), "A".into(), ChunkVersion::initial(epoch))],
        );

        let log = ChangeLog::new();
        let result = migration_commit(
            &store,
            &log,
            "db.coll",
            &migrated_range,
            &"A".to_string(),
            &"B".to_string(),
            epoch,
            Timestamp(5),
            10,
        )
        .unwrap();

        assert!(result.control.is_none());
        assert_eq!(result.migrated.shard, "B");
    }

    #[test]
    fn test_migration_commit_rejects_stale_epoch() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let migrated_range = ChunkRange::new(Key::int(0), Key::int(100)).unwrap();
        store.seed(
            "db.coll",
            vec![Chunk::new("db.coll", migrated_range.clone(), "A".into(), ChunkVersion::initial(epoch))],
        );

        let log = ChangeLog::new();
        let result = migration_commit(
            &store,
            &log,
            "db.coll",
            &migrated_range,
            &"A".to_string(),
            &"B".to_string(),
            OpaqueId::new(),
            Timestamp(5),
            10,
        );
        assert!(matches!(result, Err(Error::StaleEpoch { .. })));
    }
}
