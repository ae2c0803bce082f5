//! Merge commit algorithm.

use super::changelog::{ChangeKind, ChangeLog, ChangeLogEntry};
use super::chunk::{Chunk, HistoryEntry, ShardId, Timestamp};
use super::error::Error;
use super::store::ChunkStore;
use crate::key::Key;
use crate::oid::OpaqueId;
use crate::range::ChunkRange;
use crate::version::ChunkVersion;

pub fn merge_commit(
    store: &dyn ChunkStore,
    changelog: &ChangeLog,
    ns: &str,
    request_epoch: OpaqueId,
    boundaries: &[Key],
    owning_shard: &ShardId,
    valid_after: Option<Timestamp>,
    at: Timestamp,
) -> Result<Chunk, Error> {
    let collection_version = store.collection_version(ns);
    if collection_version.epoch != request_epoch {
        return Err(Error::StaleEpoch {
            ns: ns.to_string(),
            requested: request_epoch,
            current: collection_version.epoch,
        });
    }

    if boundaries.len() < 3 {
        return Err(Error::TooFewMergeBoundaries);
    }
    for window in boundaries.windows(2) {
        if window[0] >= window[1] {
            return Err(Error::TooFewMergeBoundaries);
        }
    }

    let existing = store.chunks(ns);
    let mut originals = Vec::with_capacity(boundaries.len() - 1);
    for window in boundaries.windows(2) {
        let range = ChunkRange::new(window[0].clone(), window[1].clone())
            .map_err(|_| Error::TooFewMergeBoundaries)?;
        let found = existing
            .iter()
            .find(|c| c.range == range && &c.shard == owning_shard && c.version.epoch == request_epoch)
            .ok_or_else(|| Error::IncompatibleShardingMetadata { ns: ns.to_string() })?;
        originals.push(found.clone());
    }

    let merged_range = ChunkRange::new(boundaries[0].clone(), boundaries[boundaries.len() - 1].clone())
        .map_err(|_| Error::TooFewMergeBoundaries)?;
    let merged_version = ChunkVersion::new(request_epoch, collection_version.major, collection_version.minor + 1);

    let mut merged = originals[0].clone();
    merged.range = merged_range;
    merged.version = merged_version;
    if let Some(valid_after) = valid_after {
        merged.prepend_history(HistoryEntry {
            valid_after,
            shard: owning_shard.clone(),
        })?;
    }

    store.compare_and_replace(ns, &originals, vec![merged.clone()])?;

    changelog.record(ChangeLogEntry {
        ns: ns.to_string(),
        kind: ChangeKind::Merge,
        before: Some(collection_version),
        after: merged_version,
        at,
    });

    Ok(merged)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::store::FakeChunkStore;

    #[test]
    fn test_merge_three_contiguous_chunks() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let v = ChunkVersion::new(epoch, 5, 3);
        store.seed(
            "db.coll",
            vec![
                Chunk::new("db.coll", ChunkRange::new(Key::int(0), Key::int(10)).unwrap(), "A".into(), v),
                Chunk::new("db.coll", ChunkRange::new(Key::int(10), Key::int(20)).unwrap(), "A".into(), v),
                Chunk::new("db.coll", ChunkRange::new(Key::int(20), Key::int(30)).unwrap(), "A".into(), v),
            ],
        );

        let log = ChangeLog::new();
        let merged = merge_commit(
            &store,
            &log,
            "db.coll",
            epoch,
            &[Key::int(0), Key::int(10), Key::int(20), Key::int(30)],
            &"A".to_string(),
            None,
            Timestamp(1),
        )
        .unwrap();

        assert_eq!(merged.range, ChunkRange::new(Key::int(0), Key::int(30)).unwrap());
        assert_eq!(merged.version, ChunkVersion::new(epoch, 5, 4));
        assert_eq!(store.chunks("db.coll").len(), 1);
    }

    #[test]
    fn test_merge_requires_at_least_two_chunks() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let log = ChangeLog::new();
        let result = merge_commit(
            &store,
            &log,
            "db.coll",
            epoch,
            &[Key::int(0), Key::int(10)],
            &"A".to_string(),
            None,
            Timestamp(1),
        );
        assert!(matches!(result, Err(Error::TooFewMergeBoundaries)));
    }

    #[test]
    fn test_merge_rejects_mismatched_precondition() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let v = ChunkVersion::initial(epoch);
        store.seed(
            "db.coll",
            vec![Chunk::new("db.coll", ChunkRange::new(Key::int(0), Key::int(10)).unwrap(), "A".into(), v)],
        );
        let log = ChangeLog::new();
        let result = merge_commit(
            &store,
            &log,
            "db.coll",
            epoch,
            &[Key::int(0), Key::int(10), Key::int(20)],
            &"A".to_string(),
            None,
            Timestamp(1),
        );
        assert!(matches!(result, Err(Error::IncompatibleShardingMetadata { .. })));
    }
}
