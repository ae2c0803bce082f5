use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::catalog::Catalog;
use super::error::Error;
use super::migration::Migration;
use super::monitor::Monitor;

/// Top-level configuration, deserialized from `clustermap.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub monitor: Monitor,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub migration: Migration,
}

impl Config {
    /// Load configuration from disk, falling back to defaults if the file
    /// doesn't exist.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let config: Config = match read_to_string(path) {
            Ok(contents) => {
                let config =
                    toml::from_str(&contents).map_err(|e| Error::Parse(path.to_owned(), e))?;
                info!("loaded \"{}\"", path.display());
                config
            }
            Err(_) => {
                warn!(
                    "\"{}\" doesn't exist, loading defaults instead",
                    path.display()
                );
                Config::default()
            }
        };

        config.catalog.validate()?;

        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("clustermap.toml")
    }
}
