//! Idempotent history upgrade/downgrade sweeps.

use super::changelog::{ChangeKind, ChangeLog, ChangeLogEntry};
use super::chunk::{HistoryEntry, Timestamp};
use super::error::Error;
use super::store::ChunkStore;

/// Attach a single-entry history to every chunk of `ns` that lacks one,
/// bumping that chunk's version once. Chunks that already have history are
/// left untouched, so a repeated sweep is a no-op.
pub fn history_upgrade(store: &dyn ChunkStore, changelog: &ChangeLog, ns: &str, at: Timestamp) -> Result<usize, Error> {
    let mut touched = 0;
    let mut last_version = None;
    for chunk in store.chunks(ns) {
        if !chunk.history.is_empty() {
            continue;
        }
        let mut updated = chunk.clone();
        updated.history.push(HistoryEntry {
            valid_after: at,
            shard: chunk.shard.clone(),
        });
        updated.version = chunk.version.next_minor();
        store.compare_and_replace(ns, &[chunk], vec![updated.clone()])?;
        last_version = Some(updated.version);
        touched += 1;
    }
    if let Some(after) = last_version {
        changelog.record(ChangeLogEntry {
            ns: ns.to_string(),
            kind: ChangeKind::HistoryUpgrade,
            before: None,
            after,
            at,
        });
    }
    Ok(touched)
}

/// Clear history on every chunk of `ns` that has any, bumping that chunk's
/// version once. Idempotent for the same reason as `history_upgrade`.
pub fn history_downgrade(store: &dyn ChunkStore, changelog: &ChangeLog, ns: &str, at: Timestamp) -> Result<usize, Error> {
    let mut touched = 0;
    let mut last_version = None;
    for chunk in store.chunks(ns) {
        if chunk.history.is_empty() {
            continue;
        }
        let mut updated = chunk.clone();
        updated.history.clear();
        updated.version = chunk.version.next_minor();
        store.compare_and_replace(ns, &[chunk], vec![updated.clone()])?;
        last_version = Some(updated.version);
        touched += 1;
    }
    if let Some(after) = last_version {
        changelog.record(ChangeLogEntry {
            ns: ns.to_string(),
            kind: ChangeKind::HistoryDowngrade,
            before: None,
            after,
            at,
        });
    }
    Ok(touched)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::chunk::Chunk;
    use crate::catalog::store::FakeChunkStore;
    use crate::key::Key;
    use crate::oid::OpaqueId;
    use crate::range::ChunkRange;
    use crate::version::ChunkVersion;

    #[test]
    fn test_history_upgrade_is_idempotent() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        store.seed(
            "db.coll",
            vec![Chunk::new(
                "db.coll",
                ChunkRange::new(Key::int(0), Key::int(10)).unwrap(),
                "A".into(),
                ChunkVersion::initial(epoch),
            )],
        );
        let log = ChangeLog::new();

        let touched_first = history_upgrade(&store, &log, "db.coll", Timestamp(1)).unwrap();
        assert_eq!(touched_first, 1);
        assert!(!store.chunks("db.coll")[0].history.is_empty());

        let touched_second = history_upgrade(&store, &log, "db.coll", Timestamp(2)).unwrap();
        assert_eq!(touched_second, 0);
    }

    #[test]
    fn test_history_downgrade_clears_and_is_idempotent() {
        let store = FakeChunkStore::new();
        let epoch = OpaqueId::new();
        let mut chunk = Chunk::new(
            "db.coll",
            ChunkRange::new(Key::int(0), Key::int(10)).unwrap(),
            "A".into(),
            ChunkVersion::initial(epoch),
        );
        chunk.history.push(HistoryEntry { valid_after: Timestamp(1), shard: "A".into() });
        store.seed("db.coll", vec![chunk]);
        let log = ChangeLog::new();

        let touched_first = history_downgrade(&store, &log, "db.coll", Timestamp(2)).unwrap();
        assert_eq!(touched_first, 1);
        assert!(store.chunks("db.coll")[0].history.is_empty());

        let touched_second = history_downgrade(&store, &log, "db.coll", Timestamp(3)).unwrap();
        assert_eq!(touched_second, 0);
    }
}
