//! Reuse decision
//!
//! A cached layer is reused only when its recorded fingerprint equals the
//! current one. No partial matches.

use crate::layer::fingerprint::LayerFingerprint;
use crate::layer::metadata::LayerMetadata;
use std::fmt;

/// Outcome of comparing the current build against the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Serve the previous layer unchanged
    Reuse,
    /// Install afresh
    Rebuild,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reuse => write!(f, "reuse"),
            Self::Rebuild => write!(f, "rebuild"),
        }
    }
}

/// Decide whether the previous layer can be reused
pub fn decide(current: &LayerFingerprint, previous: Option<&LayerMetadata>) -> Decision {
    match previous {
        Some(md) if md.fingerprint == *current => Decision::Reuse,
        _ => Decision::Rebuild,
    }
}
