//! Candidate constraint sources
//!
//! Reads version constraints from every recognized origin without deciding
//! between them. The priority order is fixed by [`SourceKind`].

use semver::Version;
use std::fmt;
use tracing::{debug, warn};

/// Lock-file name, also the source's display name
pub const LOCK_FILE: &str = "Gemfile.lock";

/// Environment variable carrying an explicit version override
pub const OVERRIDE_ENV: &str = "BP_BUNDLER_VERSION";

/// Display name of the buildpack default source
pub const DEFAULT_SOURCE: &str = "<unknown>";

/// Marker line preceding the version that produced the lock-file
const BUNDLED_WITH: &str = "BUNDLED WITH";

/// Origins of a version constraint, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    /// `BUNDLED WITH` in `Gemfile.lock`
    LockFile,
    /// `BP_BUNDLER_VERSION`
    Override,
    /// Buildpack default
    Default,
}

impl SourceKind {
    /// All kinds, highest priority first
    pub const ALL: [Self; 3] = [Self::LockFile, Self::Override, Self::Default];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::LockFile => LOCK_FILE,
            Self::Override => OVERRIDE_ENV,
            Self::Default => DEFAULT_SOURCE,
        }
    }

    /// Priority, lower wins
    pub fn priority(&self) -> u8 {
        match self {
            Self::LockFile => 0,
            Self::Override => 1,
            Self::Default => 2,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A constraint as read from one origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSource {
    /// Which origin this is
    pub kind: SourceKind,
    /// Display name of the origin
    pub name: String,
    /// Constraint text, empty when absent
    pub raw_constraint: String,
    /// Priority, lower wins
    pub priority: u8,
    /// Whether the origin supplied a usable constraint
    pub present: bool,
}

impl ConstraintSource {
    fn new(kind: SourceKind, constraint: Option<String>) -> Self {
        let present = constraint.is_some();
        Self {
            kind,
            name: kind.name().to_string(),
            raw_constraint: constraint.unwrap_or_default(),
            priority: kind.priority(),
            present,
        }
    }
}

/// Raw inputs for the source reader
#[derive(Debug, Clone, Default)]
pub struct SourceInputs<'a> {
    /// Contents of `Gemfile.lock`, if the application has one
    pub lock_file: Option<&'a str>,
    /// Value of the override variable, if set
    pub override_value: Option<&'a str>,
    /// Buildpack default constraint
    pub default_constraint: &'a str,
}

/// Read all candidate sources in priority order.
///
/// An unparsable lock-file version counts as absent so resolution falls
/// through to the next source; it is logged so the fallthrough is visible.
pub fn read_sources(inputs: &SourceInputs<'_>) -> [ConstraintSource; 3] {
    let lock = inputs.lock_file.and_then(|content| {
        let token = bundled_with(content);
        match token {
            Some(token) if Version::parse(&token).is_ok() => Some(token),
            Some(token) => {
                warn!(
                    "Ignoring unparsable {} version '{}' in {}",
                    BUNDLED_WITH, token, LOCK_FILE
                );
                None
            }
            None => {
                debug!("{} has no {} section", LOCK_FILE, BUNDLED_WITH);
                None
            }
        }
    });

    let override_value = non_blank(inputs.override_value);
    let default_value = non_blank(Some(inputs.default_constraint));

    SourceKind::ALL.map(|kind| {
        let constraint = match kind {
            SourceKind::LockFile => lock.clone(),
            SourceKind::Override => override_value.clone(),
            SourceKind::Default => default_value.clone(),
        };
        ConstraintSource::new(kind, constraint)
    })
}

/// Extract the token on the first non-blank line after `BUNDLED WITH`
pub fn bundled_with(content: &str) -> Option<String> {
    let mut lines = content.lines();
    lines.by_ref().find(|line| line.trim() == BUNDLED_WITH)?;
    lines
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
