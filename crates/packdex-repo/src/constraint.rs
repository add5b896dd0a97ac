//! Version constraint resolution for search results
//!
//! Constraints use the Helm (Masterminds) dialect on top of the `semver`
//! crate: `||` alternatives, comma- or space-separated comparators, an
//! optional leading `v`, bare versions meaning `=`, hyphen ranges
//! (`1.0 - 2.0`) and `!=` exclusions. A pre-release
//! version only satisfies comparators that name a pre-release themselves,
//! but then of any `major.minor.patch`: `>0.0.0-0` admits every
//! pre-release while `>0.0.0` admits none.

use semver::{BuildMetadata, Comparator, Op, Prerelease, Version, VersionReq};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{RepoError, Result};
use crate::query::ScoredResult;

/// Default constraint: stable releases only
pub const STABLE_CONSTRAINT: &str = ">0.0.0";

/// Default constraint when pre-releases are requested
pub const DEVEL_CONSTRAINT: &str = ">0.0.0-0";

/// Pick the constraint a search should apply.
///
/// An explicit, non-blank constraint always wins; otherwise the default
/// depends on whether pre-release versions are wanted.
pub fn effective_constraint(explicit: Option<&str>, include_prerelease: bool) -> &str {
    match explicit.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ if include_prerelease => {
            tracing::debug!("setting version to {}", DEVEL_CONSTRAINT);
            DEVEL_CONSTRAINT
        }
        _ => {
            tracing::debug!("setting version to {}", STABLE_CONSTRAINT);
            STABLE_CONSTRAINT
        }
    }
}

/// Parse a version leniently: `v1.2.3`, `1.2` and `1` are accepted
pub fn parse_version(raw: &str) -> std::result::Result<Version, semver::Error> {
    let s = raw.trim();
    let s = s.strip_prefix('v').unwrap_or(s);
    match Version::parse(s) {
        Ok(v) => Ok(v),
        Err(e) => coerce_partial(s).ok_or(e),
    }
}

fn coerce_partial(s: &str) -> Option<Version> {
    let split = s.find(['-', '+']).unwrap_or(s.len());
    let (core, rest) = s.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    let numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if !numeric || parts.len() > 2 {
        return None;
    }

    let padded = match parts.len() {
        1 => format!("{}.0.0{}", core, rest),
        _ => format!("{}.0{}", core, rest),
    };
    Version::parse(&padded).ok()
}

/// A parsed version constraint
#[derive(Debug, Clone)]
pub struct Constraint {
    raw: String,
    alternatives: Vec<Alternative>,
}

impl Constraint {
    /// Parse a constraint expression
    pub fn parse(raw: &str) -> Result<Self> {
        let alternatives = raw
            .split("||")
            .map(Alternative::parse)
            .collect::<std::result::Result<Vec<_>, String>>()
            .map_err(|message| RepoError::InvalidConstraint {
                constraint: raw.to_string(),
                message,
            })?;

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// The expression this constraint was parsed from
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check a version against the constraint
    pub fn matches(&self, version: &Version) -> bool {
        let version = Version {
            build: BuildMetadata::EMPTY,
            ..version.clone()
        };
        self.alternatives.iter().any(|alt| alt.admits(&version))
    }
}

impl FromStr for Constraint {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// One `||` branch: every comparator must hold and no excluded version may match
#[derive(Debug, Clone)]
struct Alternative {
    req: VersionReq,
    excluded: Vec<VersionReq>,
}

impl Alternative {
    fn parse(alt: &str) -> std::result::Result<Self, String> {
        let mut comparators = Vec::new();
        let mut excluded = Vec::new();

        for term in terms(alt) {
            match term.strip_prefix("!=") {
                Some(version) => {
                    let req = VersionReq::parse(&normalize_comparator(version))
                        .map_err(|e| e.to_string())?;
                    excluded.push(req);
                }
                None => comparators.push(normalize_comparator(&term)),
            }
        }

        if comparators.is_empty() && excluded.is_empty() {
            return Err("empty constraint".to_string());
        }
        let req = if comparators.is_empty() {
            VersionReq::STAR
        } else {
            VersionReq::parse(&comparators.join(", ")).map_err(|e| e.to_string())?
        };

        Ok(Self { req, excluded })
    }

    fn admits(&self, version: &Version) -> bool {
        req_admits(&self.req, version) && !self.excluded.iter().any(|x| x.matches(version))
    }
}

/// Split one alternative into comparator terms.
///
/// Separators are commas and whitespace, a lone operator sticks to the
/// version after it (`>= 1.0`), and a hyphen range `1.0 - 2.0` expands to
/// `>=1.0` and `<=2.0`.
fn terms(alt: &str) -> Vec<String> {
    let tokens: Vec<&str> = alt
        .split([',', ' ', '\t'])
        .filter(|t| !t.is_empty())
        .collect();
    let mut terms = Vec::new();
    let mut pending_op = String::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        if token.chars().all(is_op_char) {
            pending_op.push_str(token);
            i += 1;
            continue;
        }
        if pending_op.is_empty() && tokens.get(i + 1) == Some(&"-") {
            if let Some(upper) = tokens.get(i + 2) {
                terms.push(format!(">={}", token));
                terms.push(format!("<={}", upper));
                i += 3;
                continue;
            }
        }
        terms.push(format!("{}{}", std::mem::take(&mut pending_op), token));
        i += 1;
    }
    if !pending_op.is_empty() {
        // Dangling operator, let the parser report it
        terms.push(pending_op);
    }

    terms
}

fn normalize_comparator(token: &str) -> String {
    let split = token.find(|c: char| !is_op_char(c)).unwrap_or(token.len());
    let (op, version) = token.split_at(split);
    let version = version.strip_prefix('v').unwrap_or(version);
    let core = version.split(['-', '+']).next().unwrap_or(version);
    let wildcard = core.contains(['*', 'x', 'X']);

    if op.is_empty() && !wildcard {
        format!("={}", version)
    } else {
        format!("{}{}", op, version)
    }
}

fn is_op_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '~' | '^' | '!')
}

fn req_admits(req: &VersionReq, version: &Version) -> bool {
    if req.matches(version) {
        return true;
    }
    if version.pre.is_empty() || req.comparators.is_empty() {
        return false;
    }
    req.comparators
        .iter()
        .all(|c| !c.pre.is_empty() && comparator_admits(c, version))
}

/// Range check for a comparator that names a pre-release (and is therefore
/// fully specified), without `semver`'s same-`major.minor.patch` rule
fn comparator_admits(c: &Comparator, v: &Version) -> bool {
    let minor = c.minor.unwrap_or(0);
    let patch = c.patch.unwrap_or(0);
    let bound = Version {
        major: c.major,
        minor,
        patch,
        pre: c.pre.clone(),
        build: BuildMetadata::EMPTY,
    };

    match c.op {
        Op::Exact | Op::Wildcard => *v == bound,
        Op::Greater => *v > bound,
        Op::GreaterEq => *v >= bound,
        Op::Less => *v < bound,
        Op::LessEq => *v <= bound,
        Op::Tilde => {
            let upper = minor.checked_add(1).map(|m| lowest_of(c.major, m, 0));
            *v >= bound && below(v, upper)
        }
        Op::Caret => {
            let upper = if c.major > 0 {
                c.major.checked_add(1).map(|m| lowest_of(m, 0, 0))
            } else if minor > 0 {
                minor.checked_add(1).map(|m| lowest_of(0, m, 0))
            } else {
                patch.checked_add(1).map(|p| lowest_of(0, 0, p))
            };
            *v >= bound && below(v, upper)
        }
        _ => false,
    }
}

/// `v < upper`, where no upper bound (an overflowed component) admits everything
fn below(v: &Version, upper: Option<Version>) -> bool {
    upper.is_none_or(|upper| *v < upper)
}

/// Smallest version with the given `major.minor.patch` (its `-0` pre-release)
fn lowest_of(major: u64, minor: u64, patch: u64) -> Version {
    Version {
        major,
        minor,
        patch,
        pre: Prerelease::new("0").unwrap_or_default(),
        build: BuildMetadata::EMPTY,
    }
}

/// How a single row fared against the constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowCheck {
    Satisfies,
    Rejected,
    Skipped(String),
}

/// Filters ranked results by a version constraint
#[derive(Debug, Clone)]
pub struct ConstraintResolver {
    constraint: Constraint,
    keep_all_versions: bool,
}

impl ConstraintResolver {
    /// Parse the constraint once; a malformed expression is an error
    pub fn new(constraint: &str, keep_all_versions: bool) -> Result<Self> {
        Ok(Self {
            constraint: Constraint::parse(constraint)?,
            keep_all_versions,
        })
    }

    pub fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Check one row's version
    pub fn check(&self, result: &ScoredResult) -> RowCheck {
        match parse_version(&result.version_entry.version) {
            Ok(v) if self.constraint.matches(&v) => RowCheck::Satisfies,
            Ok(_) => RowCheck::Rejected,
            Err(e) => RowCheck::Skipped(e.to_string()),
        }
    }

    /// Filter `results`, keeping their order.
    ///
    /// Unless all versions are kept, only the first satisfying row of each
    /// package name survives. "First" is score order, not the highest
    /// version.
    pub fn apply(&self, results: Vec<ScoredResult>) -> Vec<ScoredResult> {
        let mut found: HashSet<String> = HashSet::new();
        let mut kept = Vec::new();

        for result in results {
            if !self.keep_all_versions && found.contains(&result.package_name) {
                continue;
            }
            match self.check(&result) {
                RowCheck::Satisfies => {
                    found.insert(result.package_name.clone());
                    kept.push(result);
                }
                RowCheck::Rejected => {}
                RowCheck::Skipped(reason) => {
                    tracing::debug!(
                        package = %result.package_name,
                        repository = %result.repository_name,
                        version = %result.version_entry.version,
                        "skipping unparsable version: {}",
                        reason
                    );
                }
            }
        }

        kept
    }
}

/// Parse `constraint` and filter `results` with it
pub fn apply(
    results: Vec<ScoredResult>,
    constraint: &str,
    keep_all_versions: bool,
) -> Result<Vec<ScoredResult>> {
    Ok(ConstraintResolver::new(constraint, keep_all_versions)?.apply(results))
}
