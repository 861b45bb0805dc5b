//! Build log emitter
//!
//! The build log is indented by nesting level (two spaces per level):
//!
//! ```text
//! Bundler Buildpack 1.2.3
//!   Resolving Bundler version
//!     Candidate version sources (in priority order):
//!       Gemfile.lock -> "1.17.3"
//!       <unknown>    -> "*"
//!
//!     Selected Bundler version (using Gemfile.lock): 1.17.3
//!
//!   Executing build process
//!     Installing Bundler 1.17.3
//!       Completed in 1.2s
//!
//!   Configuring environment
//!     GEM_PATH -> "$GEM_PATH:/layers/paketo-community_bundler/bundler"
//! ```

use super::context::UiContext;
use crate::error::{BuildpackError, BuildpackResult};
use crate::layer::LayerEnv;
use crate::resolve::{ConstraintSource, ResolvedVersion};
use console::style;
use semver::Version;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Writes the human-readable build log to a sink
pub struct Emitter<W: Write> {
    out: W,
    ctx: UiContext,
}

impl Emitter<std::io::Stdout> {
    /// Emitter on stdout, colored when attached to a terminal
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), UiContext::detect())
    }
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W, ctx: UiContext) -> Self {
        Self { out, ctx }
    }

    /// Recover the sink
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn title(&mut self, title: &str) -> BuildpackResult<()> {
        let title = if self.ctx.use_color() {
            style(title).bold().to_string()
        } else {
            title.to_string()
        };
        self.line(0, &title)
    }

    /// Present sources in priority order, names padded to the widest
    pub fn candidates(&mut self, tool: &str, sources: &[ConstraintSource]) -> BuildpackResult<()> {
        let mut present: Vec<&ConstraintSource> = sources.iter().filter(|s| s.present).collect();
        present.sort_by_key(|s| s.priority);
        let width = present.iter().map(|s| s.name.len()).max().unwrap_or(0);

        self.line(1, &format!("Resolving {} version", tool))?;
        self.line(2, "Candidate version sources (in priority order):")?;
        for source in present {
            self.line(
                3,
                &format!("{:<width$} -> \"{}\"", source.name, source.raw_constraint, width = width),
            )?;
        }
        self.blank()
    }

    pub fn selected(&mut self, tool: &str, rv: &ResolvedVersion) -> BuildpackResult<()> {
        self.line(
            2,
            &format!(
                "Selected {} version (using {}): {}",
                tool, rv.chosen_source_name, rv.value
            ),
        )?;
        self.blank()
    }

    pub fn executing(&mut self, tool: &str, version: &Version) -> BuildpackResult<()> {
        self.line(1, "Executing build process")?;
        self.line(2, &format!("Installing {} {}", tool, version))
    }

    pub fn completed(&mut self, elapsed: Duration) -> BuildpackResult<()> {
        self.line(3, &format!("Completed in {}", format_duration(elapsed)))?;
        self.blank()
    }

    pub fn environment(&mut self, env: &LayerEnv) -> BuildpackResult<()> {
        self.line(1, "Configuring environment")?;
        for var in env.vars() {
            self.line(2, &format!("{} -> \"{}\"", var.name, var.describe()))?;
        }
        self.blank()
    }

    pub fn reusing(&mut self, layer_path: &Path) -> BuildpackResult<()> {
        self.line(1, &format!("Reusing cached layer {}", layer_path.display()))?;
        self.blank()
    }

    fn line(&mut self, level: usize, text: &str) -> BuildpackResult<()> {
        writeln!(self.out, "{:indent$}{}", "", text, indent = level * 2).map_err(log_error)
    }

    fn blank(&mut self) -> BuildpackResult<()> {
        writeln!(self.out).map_err(log_error)
    }
}

fn log_error(e: std::io::Error) -> BuildpackError {
    BuildpackError::io("writing build log", e)
}

/// Render an elapsed time the way build logs show it (`850ms`, `1.25s`, `2m3.5s`)
pub fn format_duration(d: Duration) -> String {
    // Round to whole milliseconds before splitting off minutes
    let millis = (d.as_nanos() + 500_000) / 1_000_000;
    if millis < 1000 {
        return format!("{}ms", millis);
    }

    let minutes = millis / 60_000;
    let rem = millis % 60_000;
    let seconds = format!("{}.{:03}", rem / 1000, rem % 1000);
    let seconds = seconds.trim_end_matches('0').trim_end_matches('.');

    if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
