//! Version resolution
//!
//! Picks the highest-priority present constraint source and resolves its
//! constraint against the catalog. Pure: no IO, no clock, no network.

use crate::error::{BuildpackError, BuildpackResult};
use crate::resolve::catalog::{available_versions, AvailableVersion, Dependency};
use crate::resolve::constraint::{cmp_precedence, Constraint};
use crate::resolve::sources::ConstraintSource;
use crate::resolve::TOOL_NAME;
use semver::Version;
use std::cmp::Ordering;

/// How many alternatives to report when nothing matches
const NEAREST_LIMIT: usize = 3;

/// A concrete version chosen for install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The matched version
    pub value: Version,
    /// Name of the source whose constraint was used
    pub chosen_source_name: String,
    /// The constraint text that was resolved
    pub constraint: String,
    /// The catalog entry to install
    pub dependency: Dependency,
}

/// Select the highest-priority source that is present
pub fn select_source(sources: &[ConstraintSource]) -> BuildpackResult<&ConstraintSource> {
    let mut ordered: Vec<&ConstraintSource> = sources.iter().collect();
    ordered.sort_by_key(|s| s.priority);

    ordered
        .into_iter()
        .find(|s| s.present)
        .ok_or_else(|| BuildpackError::NoConstraint {
            tool: TOOL_NAME.to_string(),
        })
}

/// Resolve the winning source's constraint against the catalog
pub fn resolve(
    sources: &[ConstraintSource],
    catalog: &[Dependency],
) -> BuildpackResult<ResolvedVersion> {
    let source = select_source(sources)?;
    let raw = source.raw_constraint.trim();

    let constraint = Constraint::parse(raw).map_err(|reason| BuildpackError::InvalidConstraint {
        constraint: raw.to_string(),
        source_name: source.name.clone(),
        reason,
    })?;

    let available = available_versions(catalog);

    let chosen = exact_text_match(raw, &available).or_else(|| best_match(&constraint, &available));

    match chosen {
        Some(found) => Ok(ResolvedVersion {
            value: found.version.clone(),
            chosen_source_name: source.name.clone(),
            constraint: raw.to_string(),
            dependency: found.dependency.clone(),
        }),
        None => Err(BuildpackError::NoMatchingVersion {
            tool: TOOL_NAME.to_string(),
            constraint: raw.to_string(),
            source_name: source.name.clone(),
            nearest: nearest_versions(&constraint, &available, NEAREST_LIMIT),
        }),
    }
}

/// Catalog entry whose published version text equals the constraint
fn exact_text_match<'a, 'b>(
    raw: &str,
    available: &'b [AvailableVersion<'a>],
) -> Option<&'b AvailableVersion<'a>> {
    available.iter().find(|a| a.dependency.version.trim() == raw)
}

/// Highest satisfying version; the earliest catalog entry wins ties
fn best_match<'a, 'b>(
    constraint: &Constraint,
    available: &'b [AvailableVersion<'a>],
) -> Option<&'b AvailableVersion<'a>> {
    let mut best: Option<&'b AvailableVersion<'a>> = None;
    for candidate in available.iter().filter(|a| constraint.matches(&a.version)) {
        let better = match best {
            Some(current) => cmp_precedence(&candidate.version, &current.version) == Ordering::Greater,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// Versions closest to what the constraint asked for, newest first within
/// each tier: same minor line, then same major, then everything else.
fn nearest_versions(
    constraint: &Constraint,
    available: &[AvailableVersion<'_>],
    limit: usize,
) -> Vec<String> {
    let (major, minor) = constraint.line();

    let tier = |v: &Version| -> u8 {
        match (major, minor) {
            (Some(ma), Some(mi)) if v.major == ma && v.minor == mi => 0,
            (Some(ma), _) if v.major == ma => 1,
            _ => 2,
        }
    };

    let mut ranked: Vec<&AvailableVersion<'_>> = available.iter().collect();
    ranked.sort_by(|a, b| {
        tier(&a.version)
            .cmp(&tier(&b.version))
            .then_with(|| cmp_precedence(&b.version, &a.version))
            .then_with(|| a.index.cmp(&b.index))
    });

    let mut nearest: Vec<String> = Vec::with_capacity(limit);
    for entry in ranked {
        let text = entry.version.to_string();
        if !nearest.contains(&text) {
            nearest.push(text);
        }
        if nearest.len() == limit {
            break;
        }
    }
    nearest
}
