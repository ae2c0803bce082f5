//! Shard-version check: decides whether a command's routing view is still
//! valid before the shard acts on it.

use crate::critical_section::CriticalSectionRegistry;
use crate::version::ChunkVersion;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("migration commit in progress for {0:?}; retry after the critical section clears")]
    MigrationCommitInProgress(String),

    #[error("collection {ns:?} dropped and recreated: expected epoch {expected:?}, shard has {actual:?}")]
    StaleEpoch { ns: String, expected: ChunkVersion, actual: ChunkVersion },

    #[error("stale config for {ns:?}: expected {expected:?}, shard has {actual:?}")]
    StaleConfig { ns: String, expected: ChunkVersion, actual: ChunkVersion },
}

pub struct ShardVersionCheck<'a> {
    pub critical_sections: &'a CriticalSectionRegistry,
    pub critical_section_timeout: Duration,
}

impl<'a> ShardVersionCheck<'a> {
    /// Checks `expected` (as carried by the command) against `actual` (this
    /// shard's currently filtered version). Assumes the caller has already
    /// decided the command isn't direct-client and this shard is primary —
    /// those are connection-layer concerns outside this module.
    pub async fn check(&self, ns: &str, expected: ChunkVersion, actual: ChunkVersion) -> Result<(), Error> {
        if expected == ChunkVersion::IGNORED {
            return Ok(());
        }

        if self.critical_sections.is_active(ns) {
            if !self
                .critical_sections
                .wait_for_exit(ns, self.critical_section_timeout)
                .await
            {
                return Err(Error::MigrationCommitInProgress(ns.to_string()));
            }
        }

        if expected == actual {
            return Ok(());
        }
        if expected.epoch != actual.epoch {
            return Err(Error::StaleEpoch { ns: ns.to_string(), expected, actual });
        }
        if actual.is_set() && !expected.is_set() {
            return Err(Error::StaleConfig { ns: ns.to_string(), expected, actual });
        }
        if !actual.is_set() && expected.is_set() {
            return Err(Error::StaleConfig { ns: ns.to_string(), expected, actual });
        }
        if expected.major != actual.major {
            return Err(Error::StaleConfig { ns: ns.to_string(), expected, actual });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oid::OpaqueId;

    fn checker(registry: &CriticalSectionRegistry) -> ShardVersionCheck<'_> {
        ShardVersionCheck {
            critical_sections: registry,
            critical_section_timeout: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_ignored_version_skips_check() {
        let registry = CriticalSectionRegistry::new();
        let result = checker(&registry)
            .check("db.coll", ChunkVersion::IGNORED, ChunkVersion::initial(OpaqueId::new()))
            .await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_equal_versions_ok() {
        let registry = CriticalSectionRegistry::new();
        let v = ChunkVersion::initial(OpaqueId::new());
        assert_eq!(checker(&registry).check("db.coll", v, v).await, Ok(()));
    }

    #[tokio::test]
    async fn test_different_epoch_is_stale_epoch() {
        let registry = CriticalSectionRegistry::new();
        let expected = ChunkVersion::initial(OpaqueId::new());
        let actual = ChunkVersion::initial(OpaqueId::new());
        let result = checker(&registry).check("db.coll", expected, actual).await;
        assert!(matches!(result, Err(Error::StaleEpoch { .. })));
    }

    #[tokio::test]
    async fn test_unversioned_request_against_sharded_shard_is_stale_config() {
        let registry = CriticalSectionRegistry::new();
        let actual = ChunkVersion::initial(OpaqueId::new());
        let result = checker(&registry).check("db.coll", ChunkVersion::UNSHARDED, actual).await;
        assert!(matches!(result, Err(Error::StaleConfig { .. })));
    }

    #[tokio::test]
    async fn test_critical_section_fails_fast_after_timeout() {
        let registry = CriticalSectionRegistry::new();
        registry.enter("db.coll");
        let v = ChunkVersion::initial(OpaqueId::new());
        let result = checker(&registry).check("db.coll", v, v).await;
        assert!(matches!(result, Err(Error::MigrationCommitInProgress(_))));
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_critical_section_clears() {
        let registry = std::sync::Arc::new(CriticalSectionRegistry::new());
        registry.enter("db.coll");
        let v = ChunkVersion::initial(OpaqueId::new());

        let registry2 = registry.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            registry2.exit("db.coll");
        });

        let result = ShardVersionCheck {
            critical_sections: &registry,
            critical_section_timeout: Duration::from_secs(5),
        }
        .check("db.coll", v, v)
        .await;
        assert_eq!(result, Ok(()));
    }
}
