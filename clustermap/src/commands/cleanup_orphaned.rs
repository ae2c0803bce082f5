//! `cleanupOrphaned`: bounded scan for ranges this shard no longer owns
//! after a migration, so the caller can loop, deleting the underlying
//! documents, until `stopped_at_key` comes back `None`.
//!
//! Locating and deleting the orphaned documents themselves requires a
//! storage engine, which is out of scope here. This command only
//! reproduces the bounded-scan contract over the routing view: each call
//! looks at up to `batch_limit` chunks starting from `starting_from_key` and
//! reports where it stopped.

use crate::catalog::chunk::ShardId;
use crate::context::ClusterContext;
use crate::error::Error;
use crate::key::Key;
use crate::routing::error::Error as RoutingError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupOrphanedRequest {
    pub ns: String,
    pub shard: ShardId,
    pub starting_from_key: Option<Key>,
    pub batch_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupOrphanedResponse {
    pub ok: bool,
    pub stopped_at_key: Option<Key>,
}

pub fn cleanup_orphaned(ctx: &ClusterContext, req: CleanupOrphanedRequest) -> Result<CleanupOrphanedResponse, Error> {
    let entry = ctx
        .routing
        .get(&req.ns)
        .ok_or_else(|| RoutingError::NamespaceNotSharded(req.ns.clone()))?;

    let start = req.starting_from_key.unwrap_or(Key::MinKey);
    let mut scanned = 0;
    let mut stopped_at_key = None;

    for (min, route) in entry.chunks.range(start..) {
        if route.shard != req.shard {
            scanned += 1;
        }
        if scanned >= req.batch_limit.max(1) {
            stopped_at_key = Some(min.clone());
            break;
        }
    }

    Ok(CleanupOrphanedResponse { ok: true, stopped_at_key })
}
