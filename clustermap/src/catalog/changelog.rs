//! Append-only change-log entries emitted on each commit.

use super::chunk::Timestamp;
use crate::version::ChunkVersion;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeKind {
    EnableSharding,
    Split,
    MultiSplit,
    Merge,
    Migrate,
    HistoryUpgrade,
    HistoryDowngrade,
    MigrationFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub ns: String,
    pub kind: ChangeKind,
    pub before: Option<ChunkVersion>,
    pub after: ChunkVersion,
    pub at: Timestamp,
}

#[derive(Default)]
pub struct ChangeLog {
    entries: Mutex<Vec<ChangeLogEntry>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: ChangeLogEntry) {
        tracing::info!(ns = %entry.ns, kind = ?entry.kind, after = %entry.after, "catalog commit");
        self.entries.lock().push(entry);
    }

    pub fn entries_for(&self, ns: &str) -> Vec<ChangeLogEntry> {
        self.entries.lock().iter().filter(|e| e.ns == ns).cloned().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oid::OpaqueId;

    #[test]
    fn test_records_and_filters_by_namespace() {
        let log = ChangeLog::new();
        log.record(ChangeLogEntry {
            ns: "db.a".into(),
            kind: ChangeKind::Split,
            before: None,
            after: ChunkVersion::initial(OpaqueId::new()),
            at: Timestamp(1),
        });
        log.record(ChangeLogEntry {
            ns: "db.b".into(),
            kind: ChangeKind::Merge,
            before: None,
            after: ChunkVersion::initial(OpaqueId::new()),
            at: Timestamp(2),
        });
        assert_eq!(log.entries_for("db.a").len(), 1);
        assert_eq!(log.entries_for("db.b").len(), 1);
        assert_eq!(log.entries_for("db.c").len(), 0);
    }
}
