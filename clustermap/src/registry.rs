//! Shard registry: shard name → replica-set monitor mapping.

use crate::catalog::chunk::ShardId;
use crate::host::Host;
use crate::monitor::ReplicaSetMonitor;
use crate::read_preference::ReadPreference;
use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("shard {0:?} is not registered")]
    UnknownShard(ShardId),
}

/// One shard's connection target: either a single host or a replica set
/// under monitoring.
pub enum ShardTarget {
    Standalone(Host),
    ReplicaSet(ReplicaSetMonitor),
}

impl ShardTarget {
    pub fn select_host(&self, pref: &ReadPreference) -> Option<Host> {
        match self {
            ShardTarget::Standalone(host) => Some(host.clone()),
            ShardTarget::ReplicaSet(monitor) => monitor.select_host(pref),
        }
    }
}

/// Caches the mapping from shard name to its connection target. A real
/// deployment refreshes this from the config server's `config.shards`
/// collection; this registry only holds what's been explicitly registered.
#[derive(Default)]
pub struct ShardRegistry {
    shards: RwLock<HashMap<ShardId, ShardTarget>>,
}

impl ShardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, shard: ShardId, target: ShardTarget) {
        self.shards.write().insert(shard, target);
    }

    pub fn remove(&self, shard: &ShardId) {
        self.shards.write().remove(shard);
    }

    pub fn select_host(&self, shard: &ShardId, pref: &ReadPreference) -> Result<Option<Host>, Error> {
        let shards = self.shards.read();
        let target = shards.get(shard).ok_or_else(|| Error::UnknownShard(shard.clone()))?;
        Ok(target.select_host(pref))
    }

    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.shards.read().keys().cloned().collect()
    }
}
