//! Layer fingerprints
//!
//! The fingerprint is the minimal set of facts that must match for a cached
//! layer to stand in for a fresh install. No wall-clock input.

use crate::resolve::ResolvedVersion;
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identity of a reusable layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerFingerprint {
    /// Installed version
    pub version: Version,
    /// Constraint source that selected the version
    pub source_name: String,
    /// Stack the layer was built for
    pub stack_id: String,
}

impl LayerFingerprint {
    /// Short content digest (first 12 hex chars), for logs only.
    ///
    /// Reuse compares the fields themselves, never the digest.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            self.version.to_string(),
            self.source_name.clone(),
            self.stack_id.clone(),
        ] {
            hasher.update((field.len() as u64).to_be_bytes());
            hasher.update(field.as_bytes());
        }
        hex::encode(&hasher.finalize()[..6])
    }
}

impl fmt::Display for LayerFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} via {} on {}", self.version, self.source_name, self.stack_id)
    }
}

/// Compute the fingerprint of a resolution on a stack
pub fn fingerprint(rv: &ResolvedVersion, stack_id: &str) -> LayerFingerprint {
    LayerFingerprint {
        version: rv.value.clone(),
        source_name: rv.chosen_source_name.clone(),
        stack_id: stack_id.to_string(),
    }
}
