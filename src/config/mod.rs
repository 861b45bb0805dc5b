//! Configuration management for bundlepack

pub mod schema;

pub use schema::Config;

use crate::error::{BuildpackError, BuildpackResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Name of the buildpack descriptor inside the buildpack directory
pub const DESCRIPTOR_FILE: &str = "buildpack.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a config manager reading `buildpack.toml` from a buildpack directory
    pub fn new(buildpack_dir: &Path) -> Self {
        Self {
            config_path: buildpack_dir.join(DESCRIPTOR_FILE),
        }
    }

    /// Load the descriptor, falling back to defaults when it does not exist
    pub async fn load(&self) -> BuildpackResult<Config> {
        if !self.descriptor_present().await? {
            debug!(
                "Descriptor {} not found, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load the descriptor, failing when it does not exist
    pub async fn load_required(&self) -> BuildpackResult<Config> {
        if !self.descriptor_present().await? {
            return Err(BuildpackError::ConfigNotFound(self.config_path.clone()));
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> BuildpackResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BuildpackError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| BuildpackError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(
            "Loaded {} with {} catalog entries",
            path.display(),
            config.metadata.dependencies.len()
        );
        Ok(config)
    }

    async fn descriptor_present(&self) -> BuildpackResult<bool> {
        fs::try_exists(&self.config_path).await.map_err(|e| {
            BuildpackError::io(format!("checking {}", self.config_path.display()), e)
        })
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
