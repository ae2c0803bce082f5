//! Config-server admin commands: `_configsvrCommitChunk*`,
//! `_configsvrEnableSharding`, `_configsvrUpdateZoneKeyRange`.

use crate::catalog::chunk::{Chunk, ShardId, Timestamp};
use crate::context::ClusterContext;
use crate::error::Error;
use crate::key::Key;
use crate::oid::OpaqueId;
use crate::range::ChunkRange;
use crate::version::ChunkVersion;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitChunkSplitRequest {
    pub ns: String,
    pub coll_epoch: OpaqueId,
    pub min: Key,
    pub max: Key,
    pub split_points: Vec<Key>,
    pub shard: ShardId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitChunkSplitResponse {
    pub ok: bool,
    pub new_chunks: Vec<ChunkVersion>,
}

pub async fn configsvr_commit_chunk_split(
    ctx: &ClusterContext,
    req: CommitChunkSplitRequest,
    at: Timestamp,
) -> Result<CommitChunkSplitResponse, Error> {
    let range = ChunkRange::new(req.min, req.max).map_err(crate::catalog::error::Error::from)?;
    let chunks = ctx
        .catalog
        .split(&req.ns, req.coll_epoch, &range, &req.split_points, &req.shard, at)
        .await?;
    Ok(CommitChunkSplitResponse {
        ok: true,
        new_chunks: chunks.into_iter().map(|c| c.version).collect(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitChunkMergeRequest {
    pub ns: String,
    pub coll_epoch: OpaqueId,
    pub chunk_boundaries: Vec<Key>,
    pub shard: ShardId,
    pub valid_after: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitChunkMergeResponse {
    pub ok: bool,
    pub merged_version: ChunkVersion,
}

pub async fn configsvr_commit_chunk_merge(
    ctx: &ClusterContext,
    req: CommitChunkMergeRequest,
    at: Timestamp,
) -> Result<CommitChunkMergeResponse, Error> {
    let merged = ctx
        .catalog
        .merge(&req.ns, req.coll_epoch, &req.chunk_boundaries, &req.shard, req.valid_after, at)
        .await?;
    Ok(CommitChunkMergeResponse { ok: true, merged_version: merged.version })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitChunkMigrationRequest {
    pub ns: String,
    pub migrated_min: Key,
    pub migrated_max: Key,
    pub from_shard: ShardId,
    pub to_shard: ShardId,
    pub coll_epoch: OpaqueId,
    pub valid_after: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitChunkMigrationResponse {
    pub ok: bool,
    pub migrated_version: ChunkVersion,
    pub control_version: Option<ChunkVersion>,
}

pub async fn configsvr_commit_chunk_migration(
    ctx: &ClusterContext,
    req: CommitChunkMigrationRequest,
) -> Result<CommitChunkMigrationResponse, Error> {
    let range = ChunkRange::new(req.migrated_min, req.migrated_max).map_err(crate::catalog::error::Error::from)?;
    let result = ctx
        .catalog
        .commit_migration(&req.ns, &range, &req.from_shard, &req.to_shard, req.coll_epoch, req.valid_after)
        .await?;
    Ok(CommitChunkMigrationResponse {
        ok: true,
        migrated_version: result.migrated.version,
        control_version: result.control.map(|c| c.version),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnableShardingRequest {
    pub db_name: String,
    pub primary_shard: Option<ShardId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnableShardingResponse {
    pub ok: bool,
}

/// Seeds the collection's catalog with a single whole-range chunk under a
/// fresh epoch if it has none yet. There's no separate "databases"
/// collection modeled here; this command's effect is entirely in terms of
/// chunks.
pub async fn configsvr_enable_sharding(
    ctx: &ClusterContext,
    req: EnableShardingRequest,
) -> Result<EnableShardingResponse, Error> {
    if req.db_name.trim().is_empty() {
        return Err(crate::catalog::error::Error::NamespaceNotFound(req.db_name).into());
    }
    let Some(shard) = req.primary_shard else {
        return Ok(EnableShardingResponse { ok: true });
    };
    ctx.catalog.enable_sharding(&req.db_name, &shard, Timestamp(0)).await?;
    Ok(EnableShardingResponse { ok: true })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneKeyRange {
    pub range: ChunkRange,
    pub zone: Option<String>,
}

/// Zones aren't part of the chunk data model; this is a minimal bookkeeping
/// addition so `_configsvrUpdateZoneKeyRange` has somewhere to record its
/// effect.
#[derive(Default)]
pub struct ZoneRegistry {
    zones: Mutex<HashMap<String, Vec<ZoneKeyRange>>>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, ns: &str, range: ChunkRange, zone: Option<String>) {
        let mut guard = self.zones.lock();
        let entries = guard.entry(ns.to_string()).or_default();
        entries.retain(|e| e.range != range);
        entries.push(ZoneKeyRange { range, zone });
    }

    pub fn for_namespace(&self, ns: &str) -> Vec<ZoneKeyRange> {
        self.zones.lock().get(ns).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateZoneKeyRangeRequest {
    pub ns: String,
    pub min: Key,
    pub max: Key,
    pub zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateZoneKeyRangeResponse {
    pub ok: bool,
}

pub fn configsvr_update_zone_key_range(
    zones: &ZoneRegistry,
    req: UpdateZoneKeyRangeRequest,
) -> Result<UpdateZoneKeyRangeResponse, Error> {
    let range = ChunkRange::new(req.min, req.max).map_err(crate::catalog::error::Error::from)?;
    zones.update(&req.ns, range, req.zone);
    Ok(UpdateZoneKeyRangeResponse { ok: true })
}
