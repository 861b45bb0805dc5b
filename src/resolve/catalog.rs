//! Catalog of distributable versions
//!
//! Entries come from `[[metadata.dependencies]]` in `buildpack.toml`.
//! Catalog order is significant: it breaks ties between entries of equal
//! version precedence.

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Wildcard stack entry that matches every stack
pub const ANY_STACK: &str = "*";

/// One distributable version of a dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Dependency id (e.g. `bundler`)
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Version text as published
    pub version: String,

    /// Download location of the distribution
    pub uri: String,

    /// Hex SHA-256 of the distribution, verified before install when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Stacks this distribution runs on (`*` for all)
    #[serde(default)]
    pub stacks: Vec<String>,
}

impl Dependency {
    /// Whether this entry can be installed on the given stack.
    ///
    /// An empty stack list is treated as stack-agnostic.
    pub fn supports_stack(&self, stack_id: &str) -> bool {
        self.stacks.is_empty() || self.stacks.iter().any(|s| s == ANY_STACK || s == stack_id)
    }

    /// File name to store the download under
    pub fn file_name(&self) -> String {
        self.uri
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}.gem", self.id, self.version))
    }
}

/// A catalog entry whose version parsed, with its catalog position
#[derive(Debug, Clone)]
pub struct AvailableVersion<'a> {
    /// Position in the caller's catalog
    pub index: usize,
    /// Parsed version
    pub version: Version,
    /// The entry itself
    pub dependency: &'a Dependency,
}

/// Select the entries for one dependency id that support the current stack
pub fn for_stack(catalog: &[Dependency], id: &str, stack_id: &str) -> Vec<Dependency> {
    catalog
        .iter()
        .filter(|dep| dep.id == id && dep.supports_stack(stack_id))
        .cloned()
        .collect()
}

/// Parse catalog versions, skipping entries that are not valid semver
pub fn available_versions(catalog: &[Dependency]) -> Vec<AvailableVersion<'_>> {
    catalog
        .iter()
        .enumerate()
        .filter_map(|(index, dependency)| match Version::parse(dependency.version.trim()) {
            Ok(version) => Some(AvailableVersion {
                index,
                version,
                dependency,
            }),
            Err(e) => {
                warn!(
                    "Skipping catalog entry {} {}: {}",
                    dependency.id, dependency.version, e
                );
                None
            }
        })
        .collect()
}
