//! Unified version value for package versions and git tags.

use std::cmp::Ordering;
use std::fmt;

/// Tokens that name branches rather than releases. They are never coerced to
/// a semantic version.
const BRANCH_TOKENS: &[&str] = &["main", "master", "HEAD", "develop", "devel", "trunk"];

/// A version as seen by the resolver.
///
/// Package and collection registries publish semantic versions; git remotes
/// publish arbitrary tags. Tags are coerced once, at the registry boundary, via
/// [`Version::from_tag`]. Values only order against the same variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// Numeric `major.minor.patch`; pre-release and build data are always empty.
    Semantic(semver::Version),
    /// Anything without a numeric leading segment (branch names, commit ids).
    Opaque(String),
}

impl Version {
    /// Build a semantic version from its three components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Version::Semantic(semver::Version::new(major, minor, patch))
    }

    /// Parse a registry-published version string.
    ///
    /// Up to three dot-separated segments are read numerically. Each segment
    /// is truncated at its first non-digit (`3-beta` reads as `3`) and missing
    /// trailing segments are zero. A string whose first segment has no leading
    /// digit is opaque.
    pub fn parse(input: &str) -> Self {
        let raw = input.trim();
        match parse_numeric(raw) {
            Some((major, minor, patch)) => Version::new(major, minor, patch),
            None => Version::Opaque(raw.to_string()),
        }
    }

    /// Coerce a git tag into a version.
    ///
    /// A single leading `v`/`V` marker is stripped before numeric parsing, so
    /// `v1.2` and `1.2` are the same version. Branch-like tokens stay opaque.
    pub fn from_tag(tag: &str) -> Self {
        let raw = tag.trim();
        if is_branch_like(raw) {
            return Version::Opaque(raw.to_string());
        }
        let stripped = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(raw);
        Self::parse(stripped)
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, Version::Semantic(_))
    }

    /// The semantic value, if any.
    pub fn as_semantic(&self) -> Option<&semver::Version> {
        match self {
            Version::Semantic(v) => Some(v),
            Version::Opaque(_) => None,
        }
    }

    /// `major.minor` key of a semantic version.
    pub fn minor_key(&self) -> Option<String> {
        self.as_semantic()
            .map(|v| format!("{}.{}", v.major, v.minor))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Version::Semantic(a), Version::Semantic(b)) => Some(a.cmp(b)),
            (Version::Opaque(a), Version::Opaque(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Semantic(v) => write!(f, "{}.{}.{}", v.major, v.minor, v.patch),
            Version::Opaque(raw) => f.write_str(raw),
        }
    }
}

/// True for branch names that must never be treated as releases.
pub fn is_branch_like(token: &str) -> bool {
    BRANCH_TOKENS.contains(&token)
}

/// Compare two registry version strings.
///
/// Returns `None` when one side is semantic and the other opaque.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    Version::parse(a).partial_cmp(&Version::parse(b))
}

fn parse_numeric(raw: &str) -> Option<(u64, u64, u64)> {
    let mut segments = raw.split('.');
    let major = leading_number(segments.next()?)?;
    let minor = segments.next().and_then(leading_number).unwrap_or(0);
    let patch = segments.next().and_then(leading_number).unwrap_or(0);
    Some((major, minor, patch))
}

fn leading_number(segment: &str) -> Option<u64> {
    let end = segment
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(segment.len());
    if end == 0 {
        return None;
    }
    segment[..end].parse().ok()
}
