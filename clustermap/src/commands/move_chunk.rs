//! `moveChunk` orchestration and the donor/recipient control-plane RPCs it
//! drives: `_recvChunkStart`, `_recvChunkStatus`, `_recvChunkCommit`,
//! `_recvChunkAbort`, `_migrateClone`, `_transferMods`.

use crate::catalog::chunk::{ShardId, Timestamp};
use crate::context::ClusterContext;
use crate::error::Error;
use crate::host::Host;
use crate::key::Key;
use crate::migration::error::Error as MigrationError;
use crate::migration::state::{MigrationRecord, RecordId};
use crate::migration::{DonorMigration, MigrationRegistry};
use crate::range::ChunkRange;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveChunkRequest {
    pub ns: String,
    pub min: Key,
    pub max: Key,
    pub from_shard: ShardId,
    pub to_shard: ShardId,
    pub recipient_host: Host,
    pub valid_after: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveChunkResponse {
    pub ok: bool,
}

/// Drives one migration end to end: clone, catch-up, critical section,
/// recipient commit, config-server commit. This process plays both shards'
/// roles against one shared [`MigrationRegistry`], since no wire transport
/// is modeled; a real donor and recipient instead exchange these same
/// steps over RPC, with the recipient pulling batches via `_migrateClone`
/// and `_transferMods` below rather than having them pushed synchronously.
pub async fn move_chunk(ctx: &ClusterContext, req: MoveChunkRequest) -> Result<MoveChunkResponse, Error> {
    if req.from_shard == req.to_shard {
        return Err(MigrationError::Aborted {
            ns: req.ns.clone(),
            reason: "source and destination shard are the same".into(),
        }
        .into());
    }

    let range = ChunkRange::new(req.min, req.max).map_err(crate::catalog::error::Error::from)?;
    let record = MigrationRecord::new(&req.ns, range, req.from_shard.clone(), req.to_shard.clone(), req.recipient_host.clone());
    let placeholder = DonorMigration::new(record, ctx.catalog.clone(), ctx.critical_sections.clone());
    ctx.migrations.start_donor(&req.ns, placeholder)?;
    let mut donor = ctx.migrations.remove_donor(&req.ns).expect("just registered above");
    ctx.migrations.start_recipient(&req.ns);

    let result = drive_to_done(&mut donor, &ctx.migrations, &req.ns, req.valid_after).await;
    ctx.migrations.remove_recipient(&req.ns);
    result.map(|()| MoveChunkResponse { ok: true })
}

async fn drive_to_done(donor: &mut DonorMigration, migrations: &MigrationRegistry, ns: &str, valid_after: Timestamp) -> Result<(), Error> {
    donor.start_clone()?;
    donor.await_catch_up()?;
    donor.enter_critical_section()?;

    let recipient_acked = migrations.with_recipient(ns, |r| r.commit().is_ok()).unwrap_or(false);
    donor.commit_on_recipient(recipient_acked)?;
    donor.commit_on_config(valid_after).await?;
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkStartRequest {
    pub ns: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkStartResponse {
    pub ok: bool,
}

pub fn recv_chunk_start(ctx: &ClusterContext, req: RecvChunkStartRequest) -> RecvChunkStartResponse {
    ctx.migrations.start_recipient(&req.ns);
    RecvChunkStartResponse { ok: true }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkStatusRequest {
    pub ns: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkStatusResponse {
    pub active: bool,
    pub applied_record_count: usize,
    pub committed: bool,
}

pub fn recv_chunk_status(ctx: &ClusterContext, req: RecvChunkStatusRequest) -> RecvChunkStatusResponse {
    match ctx
        .migrations
        .with_recipient(&req.ns, |r| (r.applied_record_count(), r.is_committed()))
    {
        Some((applied_record_count, committed)) => RecvChunkStatusResponse { active: true, applied_record_count, committed },
        None => RecvChunkStatusResponse { active: false, applied_record_count: 0, committed: false },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkCommitRequest {
    pub ns: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkCommitResponse {
    pub ok: bool,
}

pub fn recv_chunk_commit(ctx: &ClusterContext, req: RecvChunkCommitRequest) -> Result<RecvChunkCommitResponse, Error> {
    let result = ctx
        .migrations
        .with_recipient(&req.ns, |r| r.commit())
        .ok_or_else(|| MigrationError::WrongState {
            ns: req.ns.clone(),
            expected: "an active recipient migration",
            actual: "none",
        })?;
    result?;
    Ok(RecvChunkCommitResponse { ok: true })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkAbortRequest {
    pub ns: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecvChunkAbortResponse {
    pub ok: bool,
}

pub fn recv_chunk_abort(ctx: &ClusterContext, req: RecvChunkAbortRequest) -> RecvChunkAbortResponse {
    ctx.migrations.remove_recipient(&req.ns);
    RecvChunkAbortResponse { ok: true }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateCloneRequest {
    pub ns: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateCloneResponse {
    pub record_ids: Vec<RecordId>,
}

/// Recipient pulls the donor's initial snapshot, the migration clone phase.
pub fn migrate_clone(ctx: &ClusterContext, req: MigrateCloneRequest) -> Result<MigrateCloneResponse, Error> {
    let record_ids = ctx
        .migrations
        .with_donor(&req.ns, |d| d.record.cloned_record_ids.iter().cloned().collect())
        .ok_or_else(|| MigrationError::WrongState {
            ns: req.ns.clone(),
            expected: "an active donor migration",
            actual: "none",
        })?;
    Ok(MigrateCloneResponse { record_ids })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferModsRequest {
    pub ns: String,
    pub max_batch_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferModsResponse {
    pub reload: Vec<RecordId>,
    pub delete: Vec<RecordId>,
}

/// Recipient pulls the next batch of mods accumulated since the initial
/// snapshot, the loop that continues until `MigrationRecord::caught_up`
/// goes true.
pub fn transfer_mods(ctx: &ClusterContext, req: TransferModsRequest) -> Result<TransferModsResponse, Error> {
    const AVG_RECORD_BYTES: usize = 1024;
    ctx.migrations
        .with_donor(&req.ns, |d| {
            let reload = d.record.drain_reload_batch(req.max_batch_bytes, AVG_RECORD_BYTES);
            let delete = d.record.drain_delete_batch(req.max_batch_bytes, AVG_RECORD_BYTES);
            TransferModsResponse { reload, delete }
        })
        .ok_or_else(|| {
            MigrationError::WrongState {
                ns: req.ns.clone(),
                expected: "an active donor migration",
                actual: "none",
            }
            .into()
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::chunk::Chunk;
    use crate::catalog::store::FakeChunkStore;
    use crate::oid::OpaqueId;
    use crate::version::ChunkVersion;
    use std::sync::Arc;

    fn ctx_with_chunk(ns: &str, shard: &str, epoch: OpaqueId) -> ClusterContext {
        let store = Arc::new(FakeChunkStore::new());
        store.seed(
            ns,
            vec![Chunk::new(ns, ChunkRange::new(Key::int(0), Key::int(10)).unwrap(), shard.to_string(), ChunkVersion::initial(epoch))],
        );
        ClusterContext::new(clustermap_config::Config::default(), store)
    }

    #[tokio::test]
    async fn test_move_chunk_happy_path_lands_on_recipient() {
        let ctx = ctx_with_chunk("db.coll", "A", OpaqueId::new());
        let req = MoveChunkRequest {
            ns: "db.coll".to_string(),
            min: Key::int(0),
            max: Key::int(10),
            from_shard: "A".to_string(),
            to_shard: "B".to_string(),
            recipient_host: Host::new_test("recipient"),
            valid_after: Timestamp(1),
        };
        let resp = move_chunk(&ctx, req).await.unwrap();
        assert!(resp.ok);
        assert_eq!(ctx.catalog.shard_version("db.coll", &"B".to_string()).major, 2);
        assert!(!ctx.critical_sections.is_active("db.coll"));
    }

    #[tokio::test]
    async fn test_move_chunk_rejects_identical_shards() {
        let ctx = ctx_with_chunk("db.coll", "A", OpaqueId::new());
        let req = MoveChunkRequest {
            ns: "db.coll".to_string(),
            min: Key::int(0),
            max: Key::int(10),
            from_shard: "A".to_string(),
            to_shard: "A".to_string(),
            recipient_host: Host::new_test("recipient"),
            valid_after: Timestamp(1),
        };
        let result = move_chunk(&ctx, req).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_recv_chunk_status_reports_inactive_when_unregistered() {
        let ctx = ClusterContext::new_test();
        let resp = recv_chunk_status(&ctx, RecvChunkStatusRequest { ns: "db.coll".to_string() });
        assert!(!resp.active);
    }

    #[test]
    fn test_recv_chunk_lifecycle() {
        let ctx = ClusterContext::new_test();
        recv_chunk_start(&ctx, RecvChunkStartRequest { ns: "db.coll".to_string() });
        let resp = recv_chunk_commit(&ctx, RecvChunkCommitRequest { ns: "db.coll".to_string() }).unwrap();
        assert!(resp.ok);
        assert!(recv_chunk_commit(&ctx, RecvChunkCommitRequest { ns: "db.coll".to_string() }).is_err());
        recv_chunk_abort(&ctx, RecvChunkAbortRequest { ns: "db.coll".to_string() });
        assert!(recv_chunk_commit(&ctx, RecvChunkCommitRequest { ns: "db.coll".to_string() }).is_err());
    }

    #[test]
    fn test_transfer_mods_without_active_donor_errors() {
        let ctx = ClusterContext::new_test();
        let result = transfer_mods(&ctx, TransferModsRequest { ns: "db.coll".to_string(), max_batch_bytes: 1024 });
        assert!(result.is_err());
    }
}
