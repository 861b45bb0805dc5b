//! Version constraint interpretation
//!
//! Accepted forms:
//! - exact version: `1.17.3` pins to that version
//! - wildcard: `*`, `2.*`, `2.1.*`
//! - partial version: `2` (`2.*`), `2.0` (`2.0.*`)
//! - Ruby pessimistic: `~> 2.1` (`>= 2.1, < 3`), `~> 2.1.4` (`>= 2.1.4, < 2.2`)
//! - any other semver requirement: `>=2.0, <2.2`, `^2`, `~2.1`

use semver::{Prerelease, Version, VersionReq};
use std::cmp::Ordering;

/// A parsed version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Pin to one version (build metadata ignored)
    Exact(Version),
    /// Any version satisfying the requirement
    Range(VersionReq),
}

impl Constraint {
    /// Parse constraint text
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err("constraint is empty".to_string());
        }

        if let Ok(version) = Version::parse(raw) {
            return Ok(Self::Exact(version));
        }

        if let Some(rest) = raw.strip_prefix("~>") {
            return pessimistic(rest.trim()).map(Self::Range);
        }

        if is_partial_version(raw) {
            return VersionReq::parse(&format!("{}.*", raw))
                .map(Self::Range)
                .map_err(|e| e.to_string());
        }

        VersionReq::parse(raw)
            .map(Self::Range)
            .map_err(|e| e.to_string())
    }

    /// Whether a version satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Exact(pinned) => cmp_precedence(pinned, version) == Ordering::Equal,
            Self::Range(req) => req.matches(version),
        }
    }

    /// The major and minor line the constraint targets, if any
    pub fn line(&self) -> (Option<u64>, Option<u64>) {
        match self {
            Self::Exact(v) => (Some(v.major), Some(v.minor)),
            Self::Range(req) => req
                .comparators
                .first()
                .map(|c| (Some(c.major), c.minor))
                .unwrap_or((None, None)),
        }
    }
}

/// Compare versions by semver precedence, ignoring build metadata
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    precedence_key(a).cmp(&precedence_key(b))
}

fn precedence_key(v: &Version) -> (u64, u64, u64, &Prerelease) {
    (v.major, v.minor, v.patch, &v.pre)
}

/// `2` or `2.0`: bare numeric segments naming a line rather than a release
fn is_partial_version(raw: &str) -> bool {
    let segments: Vec<&str> = raw.split('.').collect();
    (1..=2).contains(&segments.len())
        && segments
            .iter()
            .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
}

/// Translate Ruby's `~>` operator into a semver range
fn pessimistic(rest: &str) -> Result<VersionReq, String> {
    let parts = rest
        .split('.')
        .map(|p| {
            p.parse::<u64>()
                .map_err(|_| format!("invalid version segment '{}' in '~> {}'", p, rest))
        })
        .collect::<Result<Vec<u64>, String>>()?;

    let bump = |n: u64| {
        n.checked_add(1)
            .ok_or_else(|| format!("'~> {}' is out of range", rest))
    };

    let (lower, upper) = match parts.as_slice() {
        [major] => (Version::new(*major, 0, 0), Version::new(bump(*major)?, 0, 0)),
        [major, minor] => (
            Version::new(*major, *minor, 0),
            Version::new(bump(*major)?, 0, 0),
        ),
        [major, minor, patch] => (
            Version::new(*major, *minor, *patch),
            Version::new(*major, bump(*minor)?, 0),
        ),
        _ => return Err(format!("'~> {}' must have one to three segments", rest)),
    };

    VersionReq::parse(&format!(">={}, <{}", lower, upper)).map_err(|e| e.to_string())
}
