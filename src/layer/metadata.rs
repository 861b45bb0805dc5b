//! Layer metadata persistence
//!
//! Each layer's provenance lives in `<layers_dir>/<key>.toml`, the layer
//! content metadata file the lifecycle restores between builds:
//!
//! ```toml
//! launch = true
//! build = true
//! cache = true
//!
//! [metadata]
//! version = "2.1.4"
//! source = "Gemfile.lock"
//! stack = "io.buildpacks.stacks.bionic"
//! built_at = "2024-01-15T10:00:00.123456789Z"
//! artifact = "/layers/paketo-community_bundler/bundler/bin/bundler"
//! ```
//!
//! Records are replaced by write-to-temp then rename, and removed before any
//! artifact is touched, so a crash never leaves a record describing a
//! partial install. Callers sharing one layers directory must serialize.

use crate::error::{BuildpackError, BuildpackResult};
use crate::layer::fingerprint::LayerFingerprint;
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Provenance of a built layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerMetadata {
    /// What the layer was built from
    pub fingerprint: LayerFingerprint,
    /// When the layer was built; changes only on rebuild
    pub built_at: DateTime<Utc>,
    /// Installed executable
    pub artifact_path: PathBuf,
}

/// Lifecycle flags stored next to the metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerFlags {
    /// Available to the running application
    pub launch: bool,
    /// Available to subsequent buildpacks
    pub build: bool,
    /// Restored on the next build
    pub cache: bool,
}

impl Default for LayerFlags {
    fn default() -> Self {
        Self {
            launch: true,
            build: true,
            cache: true,
        }
    }
}

/// On-disk shape of a layer record
#[derive(Debug, Serialize, Deserialize)]
struct LayerRecord {
    #[serde(default)]
    launch: bool,
    #[serde(default)]
    build: bool,
    #[serde(default)]
    cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<RecordMetadata>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordMetadata {
    version: String,
    source: String,
    stack: String,
    built_at: DateTime<Utc>,
    artifact: PathBuf,
}

impl From<&LayerMetadata> for RecordMetadata {
    fn from(md: &LayerMetadata) -> Self {
        Self {
            version: md.fingerprint.version.to_string(),
            source: md.fingerprint.source_name.clone(),
            stack: md.fingerprint.stack_id.clone(),
            built_at: md.built_at,
            artifact: md.artifact_path.clone(),
        }
    }
}

/// Key-value store of layer records keyed by layer name
#[derive(Debug, Clone)]
pub struct MetadataStore {
    layers_dir: PathBuf,
}

impl MetadataStore {
    /// Create a store over the buildpack's layers directory
    pub fn new(layers_dir: impl Into<PathBuf>) -> Self {
        Self {
            layers_dir: layers_dir.into(),
        }
    }

    /// Directory holding a layer's contents
    pub fn layer_path(&self, key: &str) -> PathBuf {
        self.layers_dir.join(key)
    }

    /// Path of a layer's record
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.layers_dir.join(format!("{}.toml", key))
    }

    /// Load a layer's record.
    ///
    /// `Ok(None)` when there is no record or it carries no metadata.
    /// Unreadable or malformed records are `MetadataIo`.
    pub async fn load(&self, key: &str) -> BuildpackResult<Option<LayerMetadata>> {
        validate_layer_key(key)?;
        let path = self.record_path(key);

        let present = fs::try_exists(&path)
            .await
            .map_err(|e| metadata_io(&path, e.to_string()))?;
        if !present {
            debug!("No layer record at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| metadata_io(&path, e.to_string()))?;

        let record: LayerRecord =
            toml::from_str(&content).map_err(|e| metadata_io(&path, e.to_string()))?;

        let Some(md) = record.metadata else {
            debug!("Layer record {} has no metadata", path.display());
            return Ok(None);
        };

        let version = Version::parse(&md.version)
            .map_err(|e| metadata_io(&path, format!("version '{}': {}", md.version, e)))?;

        Ok(Some(LayerMetadata {
            fingerprint: LayerFingerprint {
                version,
                source_name: md.source,
                stack_id: md.stack,
            },
            built_at: md.built_at,
            artifact_path: md.artifact,
        }))
    }

    /// Persist a layer's record atomically
    pub async fn save(&self, key: &str, md: &LayerMetadata, flags: LayerFlags) -> BuildpackResult<()> {
        validate_layer_key(key)?;

        fs::create_dir_all(&self.layers_dir).await.map_err(|e| {
            BuildpackError::io(
                format!("creating layers directory {}", self.layers_dir.display()),
                e,
            )
        })?;

        let record = LayerRecord {
            launch: flags.launch,
            build: flags.build,
            cache: flags.cache,
            metadata: Some(RecordMetadata::from(md)),
        };
        let content = toml::to_string_pretty(&record)?;

        let path = self.record_path(key);
        let tmp = self
            .layers_dir
            .join(format!(".{}.toml.{}.tmp", key, uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&tmp, content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(BuildpackError::write(&tmp, e));
        }

        fs::rename(&tmp, &path).await.map_err(|e| {
            BuildpackError::io(format!("replacing layer record {}", path.display()), e)
        })?;

        debug!("Saved layer record {} ({})", path.display(), md.fingerprint);
        Ok(())
    }

    /// Remove a layer's record, if any
    pub async fn invalidate(&self, key: &str) -> BuildpackResult<()> {
        validate_layer_key(key)?;
        let path = self.record_path(key);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Invalidated layer record {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildpackError::io(
                format!("removing layer record {}", path.display()),
                e,
            )),
        }
    }
}

fn metadata_io(path: &Path, reason: String) -> BuildpackError {
    BuildpackError::MetadataIo {
        path: path.to_path_buf(),
        reason,
    }
}

/// Validate that a layer key is safe (no path traversal, no special characters).
pub fn validate_layer_key(key: &str) -> BuildpackResult<()> {
    if key.is_empty() {
        return Err(BuildpackError::Internal("Layer name cannot be empty".to_string()));
    }
    // Only allow alphanumeric, hyphens, underscores
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(BuildpackError::Internal(format!(
            "Invalid layer name '{}': must contain only alphanumeric characters, hyphens, or underscores",
            key
        )));
    }
    Ok(())
}
