//! Cached layer system
//!
//! A layer is the installed tool plus its provenance record and environment
//! files. Layers are reused across builds only when their fingerprint
//! matches exactly.
//!
//! # Reuse Model
//!
//! - Fingerprint = {resolved version, source name, stack id}
//! - Equal fingerprint and artifact on disk: reuse, `built_at` unchanged
//! - Anything else: invalidate record, reinstall, write a fresh record
//!
//! | Record | Fingerprint | Artifact | Decision |
//! |--------|-------------|----------|----------|
//! | missing/corrupt | - | - | rebuild |
//! | present | differs | - | rebuild |
//! | present | equal | missing | rebuild |
//! | present | equal | present | reuse |

pub mod decision;
pub mod env;
pub mod fingerprint;
pub mod metadata;

pub use decision::{decide, Decision};
pub use env::LayerEnv;
pub use fingerprint::{fingerprint, LayerFingerprint};
pub use metadata::{LayerFlags, LayerMetadata, MetadataStore};
