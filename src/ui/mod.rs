//! Build log output
//!
//! The build log is plain indented text for the platform to capture.
//! Diagnostics go through `tracing` on stderr instead.

mod context;
mod emitter;

pub use context::UiContext;
pub use emitter::{format_duration, Emitter};
