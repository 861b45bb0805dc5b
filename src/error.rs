//! Error types for bundlepack
//!
//! All modules use `BuildpackResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for buildpack operations
pub type BuildpackResult<T> = Result<T, BuildpackError>;

/// All errors that can occur during a build step
#[derive(Error, Debug)]
pub enum BuildpackError {
    // Resolution errors
    #[error("No version constraint found for {tool}")]
    NoConstraint { tool: String },

    #[error("No version of {tool} matches \"{constraint}\" (from {source_name}); nearest available: {}", format_nearest(.nearest))]
    NoMatchingVersion {
        tool: String,
        constraint: String,
        source_name: String,
        nearest: Vec<String>,
    },

    #[error("Invalid version constraint \"{constraint}\" (from {source_name}): {reason}")]
    InvalidConstraint {
        constraint: String,
        source_name: String,
        reason: String,
    },

    // Install errors
    #[error("Failed to download {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Insufficient disk space writing {0}")]
    InsufficientDiskSpace(PathBuf),

    #[error("Install command failed: {command}, stderr: {stderr}")]
    InstallCommand { command: String, stderr: String },

    #[error("Installed artifact missing: {0}")]
    ArtifactMissing(PathBuf),

    // Layer metadata errors
    #[error("Unreadable layer metadata {path}: {reason}")]
    MetadataIo { path: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_nearest(nearest: &[String]) -> String {
    if nearest.is_empty() {
        "none".to_string()
    } else {
        nearest.join(", ")
    }
}

impl BuildpackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error for a write, recognising a full disk
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if is_out_of_space(&source) {
            return Self::InsufficientDiskSpace(path);
        }
        Self::io(format!("writing {}", path.display()), source)
    }

    /// Whether a failure leaves the build recoverable without user action.
    ///
    /// Only corrupt metadata qualifies: it downgrades to a rebuild.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::MetadataIo { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NoConstraint { .. } => Some(
                "Set BP_BUNDLER_VERSION, add a BUNDLED WITH section to Gemfile.lock, \
                 or configure [metadata.default-versions] in buildpack.toml",
            ),
            Self::NoMatchingVersion { .. } => {
                Some("Pick one of the available versions or relax the constraint")
            }
            Self::InvalidConstraint { .. } => {
                Some("Use an exact version (2.1.4), a wildcard (2.1.*), or a range (~> 2.1)")
            }
            Self::ChecksumMismatch { .. } => {
                Some("The distribution may be corrupt or tampered with; check the buildpack catalog")
            }
            Self::InsufficientDiskSpace(_) => Some("Free disk space on the build host and retry"),
            _ => None,
        }
    }
}

#[cfg(unix)]
fn is_out_of_space(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENOSPC)
}

#[cfg(not(unix))]
fn is_out_of_space(_err: &std::io::Error) -> bool {
    false
}
