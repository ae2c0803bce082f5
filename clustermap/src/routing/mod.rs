//! Routing cache: collection → ordered chunk-range → shard map, refreshed
//! from the catalog manager and served from an atomically swapped snapshot
//! so readers never block behind a refresh.

pub mod error;

use crate::catalog::chunk::{Chunk, ShardId};
use crate::catalog::CatalogManager;
use crate::key::Key;
use crate::oid::OpaqueId;
use crate::version::ChunkVersion;
use arc_swap::ArcSwap;
use error::Error;
use parking_lot::Mutex as SyncMutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ChunkRoute {
    pub max: Key,
    pub shard: ShardId,
    pub version: ChunkVersion,
}

/// An immutable, validated routing snapshot for one namespace.
#[derive(Debug, Clone)]
pub struct RoutingEntry {
    pub ns: String,
    pub epoch: OpaqueId,
    /// Ordered by `min`; chunk ranges always partition the keyspace.
    pub chunks: BTreeMap<Key, ChunkRoute>,
}

impl RoutingEntry {
    fn build(ns: &str, chunks: Vec<Chunk>) -> Result<Self, Error> {
        if chunks.is_empty() {
            return Err(Error::NamespaceNotSharded(ns.to_string()));
        }
        let epoch = chunks[0].version.epoch;

        let mut ordered: BTreeMap<Key, ChunkRoute> = BTreeMap::new();
        for chunk in chunks {
            if chunk.version.epoch != epoch {
                return Err(Error::MixedEpochs(ns.to_string()));
            }
            ordered.insert(
                chunk.range.min,
                ChunkRoute {
                    max: chunk.range.max,
                    shard: chunk.shard,
                    version: chunk.version,
                },
            );
        }

        validate_partition(ns, &ordered)?;
        Ok(Self { ns: ns.to_string(), epoch, chunks: ordered })
    }

    pub fn shard_for(&self, key: &Key) -> Option<&ShardId> {
        self.chunks
            .range(..=key.clone())
            .next_back()
            .filter(|(_, route)| key < &route.max)
            .map(|(_, route)| &route.shard)
    }
}

fn validate_partition(ns: &str, chunks: &BTreeMap<Key, ChunkRoute>) -> Result<(), Error> {
    let mut expected_min = Key::MinKey;
    for (min, route) in chunks {
        if min != &expected_min {
            return Err(Error::GapOrOverlap(ns.to_string()));
        }
        expected_min = route.max.clone();
    }
    if expected_min != Key::MaxKey {
        return Err(Error::GapOrOverlap(ns.to_string()));
    }
    Ok(())
}

pub struct RoutingCache {
    catalog: Arc<CatalogManager>,
    tables: ArcSwap<HashMap<String, Arc<RoutingEntry>>>,
    write_lock: SyncMutex<()>,
    in_flight: Mutex<HashMap<String, Arc<Notify>>>,
}

impl RoutingCache {
    pub fn new(catalog: Arc<CatalogManager>) -> Self {
        Self {
            catalog,
            tables: ArcSwap::from_pointee(HashMap::new()),
            write_lock: SyncMutex::new(()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Last-known-good snapshot, served without blocking on any in-flight
    /// refresh.
    pub fn get(&self, ns: &str) -> Option<Arc<RoutingEntry>> {
        self.tables.load().get(ns).cloned()
    }

    /// Idempotent, join-able refresh: concurrent callers for the same `ns`
    /// share one fetch and notification rather than racing the catalog.
    pub async fn refresh(&self, ns: &str) -> Result<Arc<RoutingEntry>, Error> {
        let notify = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(existing) = in_flight.get(ns) {
                Some(existing.clone())
            } else {
                in_flight.insert(ns.to_string(), Arc::new(Notify::new()));
                None
            }
        };

        if let Some(notify) = notify {
            notify.notified().await;
            return self.get(ns).ok_or_else(|| Error::NamespaceNotSharded(ns.to_string()));
        }

        let result = self.do_refresh(ns);

        let mut in_flight = self.in_flight.lock().await;
        if let Some(notify) = in_flight.remove(ns) {
            notify.notify_waiters();
        }

        result
    }

    fn do_refresh(&self, ns: &str) -> Result<Arc<RoutingEntry>, Error> {
        let chunks = self.catalog.chunks(ns);
        let entry = Arc::new(RoutingEntry::build(ns, chunks)?);

        let previous_epoch = self.get(ns).map(|e| e.epoch);
        if previous_epoch.is_some_and(|prev| prev != entry.epoch) {
            info!(%ns, "collection epoch changed, dropping prior routing state");
        }

        let _guard = self.write_lock.lock();
        let mut next = (**self.tables.load()).clone();
        next.insert(ns.to_string(), entry.clone());
        self.tables.store(Arc::new(next));

        Ok(entry)
    }

    pub fn drop_namespace(&self, ns: &str) {
        let _guard = self.write_lock.lock();
        if !self.tables.load().contains_key(ns) {
            return;
        }
        let mut next = (**self.tables.load()).clone();
        next.remove(ns);
        self.tables.store(Arc::new(next));
    }
}
