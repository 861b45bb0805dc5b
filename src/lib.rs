//! bundlepack - Bundler buildpack build step
//!
//! Picks the Bundler version an application needs from its lock-file, an
//! explicit override, or the buildpack default, and installs it into a
//! cached layer that is reused while the inputs stay the same.

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod layer;
pub mod resolve;
pub mod ui;

pub use error::{BuildpackError, BuildpackResult};
