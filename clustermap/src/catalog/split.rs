//! Split commit algorithm.

use super::chunk::{Chunk, ShardId};
use super::changelog::{ChangeKind, ChangeLog, ChangeLogEntry};
use super::chunk::Timestamp;
use super::error::Error;
use super::store::ChunkStore;
use crate::key::Key;
use crate::oid::OpaqueId;
use crate::range::ChunkRange;
use crate::version::ChunkVersion;

pub fn split_commit(
    store: &dyn ChunkStore,
    changelog: &ChangeLog,
    ns: &str,
    request_epoch: OpaqueId,
    range: &ChunkRange,
    split_points: &[Key],
    owning_shard: &ShardId,
    at: Timestamp,
) -> Result<Vec<Chunk>, Error> {
    let collection_version = store.collection_version(ns);
    if collection_version.epoch != request_epoch {
        return Err(Error::StaleEpoch {
            ns: ns.to_string(),
            requested: request_epoch,
            current: collection_version.epoch,
        });
    }

    if split_points.is_empty() {
        return Err(Error::NoSplitPoints);
    }
    validate_split_points(range, split_points)?;

    let shard_version = store.shard_version(ns, owning_shard);
    let new_major = if shard_version == collection_version {
        collection_version.major + 1
    } else {
        collection_version.major
    };

    let original = store
        .chunks(ns)
        .into_iter()
        .find(|c| &c.range == range && &c.shard == owning_shard && c.version.epoch == request_epoch)
        .ok_or_else(|| Error::IncompatibleShardingMetadata { ns: ns.to_string() })?;

    let mut boundaries = Vec::with_capacity(split_points.len() + 2);
    boundaries.push(range.min.clone());
    boundaries.extend(split_points.iter().cloned());
    boundaries.push(range.max.clone());

    let mut new_chunks = Vec::with_capacity(boundaries.len() - 1);
    for (i, window) in boundaries.windows(2).enumerate() {
        let sub_range = ChunkRange::new(window[0].clone(), window[1].clone())
            .map_err(|_| Error::InvalidSplitPoint)?;
        let version = ChunkVersion::new(
            request_epoch,
            new_major,
            collection_version.minor + 1 + i as u32,
        );
        new_chunks.push(Chunk::new(ns, sub_range, owning_shard.clone(), version));
    }

    store.compare_and_replace(ns, &[original], new_chunks.clone())?;

    let kind = if new_chunks.len() > 2 {
        ChangeKind::MultiSplit
    } else {
        ChangeKind::Split
    };
    changelog.record(ChangeLogEntry {
        ns: ns.to_string(),
        kind,
        before: Some(collection_version),
        after: new_chunks.last().unwrap().version,
        at,
    });

    Ok(new_chunks)
}

fn validate_split_points(range: &ChunkRange, points: &[Key]) -> Result<(), Error> {
    let mut prev = &range.min;
    for point in points {
        if point <= prev || point >= &range.max {
            return Err(Error::InvalidSplitPoint);
        }
        prev = point;
    }
    Ok(())
}
