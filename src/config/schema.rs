//! Configuration schema for bundlepack
//!
//! Configuration is the buildpack descriptor, `buildpack.toml`, shipped in
//! the buildpack directory. The `[metadata]` table carries the catalog of
//! distributable versions and the install settings.

use crate::resolve::catalog::Dependency;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Buildpack API version
    pub api: String,

    /// Buildpack identity
    pub buildpack: BuildpackInfo,

    /// Catalog and install settings
    pub metadata: MetadataConfig,
}

/// Buildpack identity section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackInfo {
    /// Namespaced id, e.g. `paketo-community/bundler`
    pub id: String,

    /// Human-readable name used as the build log title
    pub name: String,

    /// Buildpack version
    pub version: String,
}

impl Default for BuildpackInfo {
    fn default() -> Self {
        Self {
            id: "paketo-community/bundler".to_string(),
            name: "Bundler Buildpack".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl BuildpackInfo {
    /// Title line of the build log
    pub fn title(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

/// `[metadata]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MetadataConfig {
    /// Default constraints, keyed by dependency id
    pub default_versions: DefaultVersions,

    /// Install settings
    pub install: InstallConfig,

    /// Distributable versions, in catalog order
    pub dependencies: Vec<Dependency>,
}

/// `[metadata.default-versions]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultVersions {
    /// Fallback constraint when no other source is present
    pub bundler: String,
}

impl Default for DefaultVersions {
    fn default() -> Self {
        Self {
            bundler: "*".to_string(),
        }
    }
}

/// `[metadata.install]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallConfig {
    /// Download and install timeout in seconds
    pub timeout_secs: u64,

    /// Program used to install the downloaded distribution
    pub gem_command: String,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            gem_command: "gem".to_string(),
        }
    }
}
