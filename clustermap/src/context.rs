//! `ClusterContext`: the explicit bag of shared state that stands in for
//! process-global statics. Command handlers and catalog methods take this
//! by reference instead of reaching for ambient globals.

use crate::catalog::store::ChunkStore;
use crate::catalog::CatalogManager;
use crate::commands::catalog_commands::ZoneRegistry;
use crate::critical_section::CriticalSectionRegistry;
use crate::migration::MigrationRegistry;
use crate::registry::ShardRegistry;
use crate::routing::RoutingCache;
use clustermap_config::Config;
use std::sync::Arc;

pub struct ClusterContext {
    pub config: Config,
    pub catalog: Arc<CatalogManager>,
    pub routing: Arc<RoutingCache>,
    pub shards: Arc<ShardRegistry>,
    pub critical_sections: Arc<CriticalSectionRegistry>,
    pub migrations: Arc<MigrationRegistry>,
    pub zones: ZoneRegistry,
}

impl ClusterContext {
    pub fn new(config: Config, store: Arc<dyn ChunkStore>) -> Self {
        let catalog = Arc::new(CatalogManager::with_retry_budget(
            store,
            config.catalog.chunk_op_lock_stripes as usize,
            config.catalog.history_retention().as_secs(),
            config.catalog.max_transient_retries,
        ));
        let routing = Arc::new(RoutingCache::new(catalog.clone()));

        Self {
            config,
            catalog,
            routing,
            shards: Arc::new(ShardRegistry::new()),
            critical_sections: Arc::new(CriticalSectionRegistry::new()),
            migrations: Arc::new(MigrationRegistry::new()),
            zones: ZoneRegistry::new(),
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        use crate::catalog::store::FakeChunkStore;
        Self::new(Config::default(), Arc::new(FakeChunkStore::new()))
    }
}
