//! Version resolution
//!
//! Turns the application's lock-file, the environment override, and the
//! buildpack default into one concrete, installable catalog entry.
//!
//! # Source priority
//!
//! | Priority | Source | Origin |
//! |----------|--------|--------|
//! | 0 | `Gemfile.lock` | `BUNDLED WITH` section |
//! | 1 | `BP_BUNDLER_VERSION` | environment |
//! | 2 | `<unknown>` | `[metadata.default-versions]` |

pub mod catalog;
pub mod constraint;
pub mod resolver;
pub mod sources;

pub use catalog::{for_stack, Dependency};
pub use constraint::Constraint;
pub use resolver::{resolve, select_source, ResolvedVersion};
pub use sources::{read_sources, ConstraintSource, SourceInputs, SourceKind};

/// Catalog id of the managed tool
pub const TOOL_ID: &str = "bundler";

/// Display name of the managed tool
pub const TOOL_NAME: &str = "Bundler";
