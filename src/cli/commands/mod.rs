//! CLI command implementations

pub mod build;
pub mod completions;
pub mod inspect;
pub mod resolve;

pub use build::execute as build;
pub use completions::execute as completions;
pub use inspect::execute as inspect;
pub use resolve::execute as resolve;
