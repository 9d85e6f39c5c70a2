//! Python interpreter pinning against the supported release allow-list.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ResolveError;
use crate::version::Version;

/// Supported Python minors and the single canonical patch release for each,
/// oldest first.
pub const PYTHON_RELEASES: [(&str, &str); 4] = [
    ("3.10", "3.10.16"),
    ("3.11", "3.11.11"),
    ("3.12", "3.12.8"),
    ("3.13", "3.13.1"),
];

/// Interpreter version spec as declared in the project manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PythonDeclaration {
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
    #[serde(default)]
    pub pinned: Option<String>,
    #[serde(default)]
    pub additional: Vec<String>,
}

/// Validated interpreter spec as persisted in the lock document.
///
/// `pinned` is always an allow-list value; `additional` is always empty once
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterSpec {
    pub min: String,
    pub max: String,
    pub pinned: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional: Vec<String>,
}

impl InterpreterSpec {
    /// `major.minor` of the pinned release.
    pub fn pinned_minor(&self) -> String {
        Version::parse(&self.pinned)
            .minor_key()
            .unwrap_or_else(|| self.pinned.clone())
    }

    /// Check the persisted invariant: pinned is one of the allowed releases.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if !is_allowed_release(&self.pinned) {
            return Err(incompatible("pinned", &self.pinned, &allowed_releases()));
        }
        Ok(())
    }
}

/// Canonical patch release for a `major.minor` key.
pub fn canonical_patch(minor: &str) -> Option<&'static str> {
    PYTHON_RELEASES
        .iter()
        .find(|(key, _)| *key == minor)
        .map(|(_, release)| *release)
}

pub fn is_allowed_release(release: &str) -> bool {
    PYTHON_RELEASES.iter().any(|(_, r)| *r == release)
}

pub fn oldest_minor() -> &'static str {
    PYTHON_RELEASES[0].0
}

pub fn newest_minor() -> &'static str {
    PYTHON_RELEASES[PYTHON_RELEASES.len() - 1].0
}

/// Validate a declared interpreter spec and fill in defaults.
///
/// `min`/`max` default to the oldest/newest supported minor; `pinned` defaults
/// to the canonical release of `max`. Declared `additional` versions are not
/// supported downstream and are dropped with a warning appended to `warnings`.
pub fn resolve_interpreter(
    declared: &PythonDeclaration,
    warnings: &mut Vec<String>,
) -> Result<InterpreterSpec, ResolveError> {
    let min = checked_minor("min", declared.min.as_deref().unwrap_or(oldest_minor()))?;
    let max = checked_minor("max", declared.max.as_deref().unwrap_or(newest_minor()))?;

    if Version::parse(&min) > Version::parse(&max) {
        return Err(ResolveError::IncompatibleVersion {
            field: "range",
            value: format!("{}..{}", min, max),
            allowed: "min <= max".to_string(),
        });
    }

    let pinned = match declared.pinned.as_deref().map(str::trim) {
        Some(release) if !release.is_empty() => {
            if !is_allowed_release(release) {
                return Err(incompatible("pinned", release, &allowed_releases()));
            }
            let pinned_version = Version::parse(release);
            let floor = Version::parse(&min);
            let ceiling = Version::parse(&format!("{}.9999", max));
            if pinned_version < floor || pinned_version > ceiling {
                return Err(incompatible(
                    "pinned",
                    release,
                    &format!("a release between {} and {}", min, max),
                ));
            }
            release.to_string()
        }
        _ => canonical_patch(&max)
            .map(str::to_string)
            .ok_or_else(|| incompatible("max", &max, &allowed_minors()))?,
    };

    if !declared.additional.is_empty() {
        warn!(
            additional = ?declared.additional,
            "Dropping unsupported additional python versions"
        );
        warnings.push(format!(
            "additional python versions [{}] are not supported and were dropped",
            declared.additional.join(", ")
        ));
    }

    Ok(InterpreterSpec {
        min,
        max,
        pinned,
        additional: Vec::new(),
    })
}

fn checked_minor(field: &'static str, value: &str) -> Result<String, ResolveError> {
    let value = value.trim();
    if canonical_patch(value).is_none() {
        return Err(incompatible(field, value, &allowed_minors()));
    }
    Ok(value.to_string())
}

fn incompatible(field: &'static str, value: &str, allowed: &str) -> ResolveError {
    ResolveError::IncompatibleVersion {
        field,
        value: value.to_string(),
        allowed: allowed.to_string(),
    }
}

fn allowed_minors() -> String {
    PYTHON_RELEASES
        .iter()
        .map(|(minor, _)| *minor)
        .collect::<Vec<_>>()
        .join(", ")
}

fn allowed_releases() -> String {
    PYTHON_RELEASES
        .iter()
        .map(|(_, release)| *release)
        .collect::<Vec<_>>()
        .join(", ")
}
