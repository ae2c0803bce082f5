//! Shard-targeted version commands: `setShardVersion` and `getShardVersion`.

use crate::catalog::chunk::ShardId;
use crate::context::ClusterContext;
use crate::error::Error;
use crate::shard_version::ShardVersionCheck;
use crate::version::ChunkVersion;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetShardVersionRequest {
    pub ns: String,
    pub shard: ShardId,
    pub version: ChunkVersion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetShardVersionResponse {
    pub ok: bool,
    pub old_version: ChunkVersion,
}

/// Validates the caller's routing view against this shard's actual version
/// before it's allowed to proceed. A real router connection caches the
/// resulting version and skips this RPC on the next request if nothing
/// changed; that connection-level cache isn't modeled here, only the check
/// itself.
pub async fn set_shard_version(ctx: &ClusterContext, req: SetShardVersionRequest) -> Result<SetShardVersionResponse, Error> {
    let actual = ctx.catalog.shard_version(&req.ns, &req.shard);
    let checker = ShardVersionCheck {
        critical_sections: &ctx.critical_sections,
        critical_section_timeout: ctx.config.migration.critical_section_wait(),
    };
    checker.check(&req.ns, req.version, actual).await?;
    Ok(SetShardVersionResponse { ok: true, old_version: actual })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetShardVersionRequest {
    pub ns: String,
    pub shard: ShardId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetShardVersionResponse {
    pub version: ChunkVersion,
}

pub fn get_shard_version(ctx: &ClusterContext, req: GetShardVersionRequest) -> GetShardVersionResponse {
    GetShardVersionResponse {
        version: ctx.catalog.shard_version(&req.ns, &req.shard),
    }
}
