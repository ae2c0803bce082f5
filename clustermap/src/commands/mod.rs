//! The client/shard-facing command surface, dispatched through one enum
//! rather than a string-keyed registry: each request variant wraps its own
//! strongly typed struct, and [`CommandRequest`] provides the uniform
//! `name`/`execute` entry points over them.

pub mod catalog_commands;
pub mod cleanup_orphaned;
pub mod move_chunk;
pub mod routing_commands;
pub mod shard_commands;

use crate::catalog::chunk::Timestamp;
use crate::context::ClusterContext;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_timestamp() -> Timestamp {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    Timestamp(secs)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandRequest {
    CommitChunkSplit(catalog_commands::CommitChunkSplitRequest),
    CommitChunkMerge(catalog_commands::CommitChunkMergeRequest),
    CommitChunkMigration(catalog_commands::CommitChunkMigrationRequest),
    EnableSharding(catalog_commands::EnableShardingRequest),
    UpdateZoneKeyRange(catalog_commands::UpdateZoneKeyRangeRequest),
    SetShardVersion(shard_commands::SetShardVersionRequest),
    GetShardVersion(shard_commands::GetShardVersionRequest),
    MoveChunk(move_chunk::MoveChunkRequest),
    RecvChunkStart(move_chunk::RecvChunkStartRequest),
    RecvChunkStatus(move_chunk::RecvChunkStatusRequest),
    RecvChunkCommit(move_chunk::RecvChunkCommitRequest),
    RecvChunkAbort(move_chunk::RecvChunkAbortRequest),
    MigrateClone(move_chunk::MigrateCloneRequest),
    TransferMods(move_chunk::TransferModsRequest),
    CleanupOrphaned(cleanup_orphaned::CleanupOrphanedRequest),
    FlushRoutingTableCacheUpdates(routing_commands::FlushRoutingTableCacheUpdatesRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CommandResponse {
    CommitChunkSplit(catalog_commands::CommitChunkSplitResponse),
    CommitChunkMerge(catalog_commands::CommitChunkMergeResponse),
    CommitChunkMigration(catalog_commands::CommitChunkMigrationResponse),
    EnableSharding(catalog_commands::EnableShardingResponse),
    UpdateZoneKeyRange(catalog_commands::UpdateZoneKeyRangeResponse),
    SetShardVersion(shard_commands::SetShardVersionResponse),
    GetShardVersion(shard_commands::GetShardVersionResponse),
    MoveChunk(move_chunk::MoveChunkResponse),
    RecvChunkStart(move_chunk::RecvChunkStartResponse),
    RecvChunkStatus(move_chunk::RecvChunkStatusResponse),
    RecvChunkCommit(move_chunk::RecvChunkCommitResponse),
    RecvChunkAbort(move_chunk::RecvChunkAbortResponse),
    MigrateClone(move_chunk::MigrateCloneResponse),
    TransferMods(move_chunk::TransferModsResponse),
    CleanupOrphaned(cleanup_orphaned::CleanupOrphanedResponse),
    FlushRoutingTableCacheUpdates(routing_commands::FlushRoutingTableCacheUpdatesResponse),
}

impl CommandRequest {
    pub fn name(&self) -> &'static str {
        use CommandRequest::*;
        match self {
            CommitChunkSplit(_) => "_configsvrCommitChunkSplit",
            CommitChunkMerge(_) => "_configsvrCommitChunkMerge",
            CommitChunkMigration(_) => "_configsvrCommitChunkMigration",
            EnableSharding(_) => "_configsvrEnableSharding",
            UpdateZoneKeyRange(_) => "_configsvrUpdateZoneKeyRange",
            SetShardVersion(_) => "setShardVersion",
            GetShardVersion(_) => "getShardVersion",
            MoveChunk(_) => "moveChunk",
            RecvChunkStart(_) => "_recvChunkStart",
            RecvChunkStatus(_) => "_recvChunkStatus",
            RecvChunkCommit(_) => "_recvChunkCommit",
            RecvChunkAbort(_) => "_recvChunkAbort",
            MigrateClone(_) => "_migrateClone",
            TransferMods(_) => "_transferMods",
            CleanupOrphaned(_) => "cleanupOrphaned",
            FlushRoutingTableCacheUpdates(_) => "_flushRoutingTableCacheUpdates",
        }
    }

    pub async fn execute(self, ctx: &ClusterContext) -> Result<CommandResponse, Error> {
        use CommandRequest::*;
        let at = now_timestamp();
        match self {
            CommitChunkSplit(req) => catalog_commands::configsvr_commit_chunk_split(ctx, req, at)
                .await
                .map(CommandResponse::CommitChunkSplit),
            CommitChunkMerge(req) => catalog_commands::configsvr_commit_chunk_merge(ctx, req, at)
                .await
                .map(CommandResponse::CommitChunkMerge),
            CommitChunkMigration(req) => catalog_commands::configsvr_commit_chunk_migration(ctx, req)
                .await
                .map(CommandResponse::CommitChunkMigration),
            EnableSharding(req) => catalog_commands::configsvr_enable_sharding(ctx, req)
                .await
                .map(CommandResponse::EnableSharding),
            UpdateZoneKeyRange(req) => catalog_commands::configsvr_update_zone_key_range(&ctx.zones, req).map(CommandResponse::UpdateZoneKeyRange),
            SetShardVersion(req) => shard_commands::set_shard_version(ctx, req).await.map(CommandResponse::SetShardVersion),
            GetShardVersion(req) => Ok(CommandResponse::GetShardVersion(shard_commands::get_shard_version(ctx, req))),
            MoveChunk(req) => move_chunk::move_chunk(ctx, req).await.map(CommandResponse::MoveChunk),
            RecvChunkStart(req) => Ok(CommandResponse::RecvChunkStart(move_chunk::recv_chunk_start(ctx, req))),
            RecvChunkStatus(req) => Ok(CommandResponse::RecvChunkStatus(move_chunk::recv_chunk_status(ctx, req))),
            RecvChunkCommit(req) => move_chunk::recv_chunk_commit(ctx, req).map(CommandResponse::RecvChunkCommit),
            RecvChunkAbort(req) => Ok(CommandResponse::RecvChunkAbort(move_chunk::recv_chunk_abort(ctx, req))),
            MigrateClone(req) => move_chunk::migrate_clone(ctx, req).map(CommandResponse::MigrateClone),
            TransferMods(req) => move_chunk::transfer_mods(ctx, req).map(CommandResponse::TransferMods),
            CleanupOrphaned(req) => cleanup_orphaned::cleanup_orphaned(ctx, req).map(CommandResponse::CleanupOrphaned),
            FlushRoutingTableCacheUpdates(req) => routing_commands::flush_routing_table_cache_updates(ctx, req)
                .await
                .map(CommandResponse::FlushRoutingTableCacheUpdates),
        }
    }
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
    use std::sync::Arc;

    #[tokio::test]
    async fn test_dispatch_enable_sharding_then_get_shard_version() {
        let ctx = ClusterContext::new_test();
        let enable = CommandRequest::EnableSharding(catalog_commands::EnableShardingRequest {
            db_name: "db.coll".to_string(),
            primary_shard: Some("A".to_string()),
        });
        assert_eq!(enable.name(), "_configsvrEnableSharding");
        let resp = enable.execute(&ctx).await.unwrap();
        assert!(matches!(resp, CommandResponse::EnableSharding(r) if r.ok));

        let get = CommandRequest::GetShardVersion(shard_commands::GetShardVersionRequest {
            ns: "db.coll".to_string(),
            shard: "A".to_string(),
        });
        let resp = get.execute(&ctx).await.unwrap();
        match resp {
            CommandResponse::GetShardVersion(r) => assert_eq!(r.version.major, 1),
            _ => panic!("wrong response variant"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_move_chunk_end_to_end() {
        let store = Arc::new(FakeChunkStore::new());
        let epoch = OpaqueId::new();
        store.seed(
            "db.coll",
            vec![Chunk::new("db.coll", ChunkRange::whole(), "A".to_string(), ChunkVersion::initial(epoch))],
        );
        let ctx = ClusterContext::new(clustermap_config::Config::default(), store);

        let req = CommandRequest::MoveChunk(move_chunk::MoveChunkRequest {
            ns: "db.coll".to_string(),
            min: Key::MinKey,
            max: Key::MaxKey,
            from_shard: "A".to_string(),
            to_shard: "B".to_string(),
            recipient_host: crate::host::Host::new_test("recipient"),
            valid_after: Timestamp(1),
        });
        assert_eq!(req.name(), "moveChunk");
        let resp = req.execute(&ctx).await.unwrap();
        assert!(matches!(resp, CommandResponse::MoveChunk(r) if r.ok));
    }
}
