//! `_flushRoutingTableCacheUpdates`: forces a shard's routing
//! cache to refresh from the catalog.

use crate::context::ClusterContext;
use crate::error::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushRoutingTableCacheUpdatesRequest {
    pub ns: String,
    /// When false, a warm cache entry is left untouched; the refresh only
    /// happens if nothing is cached yet. When true, the refresh always runs
    /// (idempotent either way, since `RoutingCache::refresh` is join-able).
    pub sync_from_config: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushRoutingTableCacheUpdatesResponse {
    pub ok: bool,
}

pub async fn flush_routing_table_cache_updates(
    ctx: &ClusterContext,
    req: FlushRoutingTableCacheUpdatesRequest,
) -> Result<FlushRoutingTableCacheUpdatesResponse, Error> {
    if req.sync_from_config || ctx.routing.get(&req.ns).is_none() {
        ctx.routing.refresh(&req.ns).await?;
    }
    Ok(FlushRoutingTableCacheUpdatesResponse { ok: true })
}
