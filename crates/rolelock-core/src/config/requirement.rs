//! Canonical requirement records built from raw declarations.

use crate::git::{RoleSource, SourceKind};
use crate::types::DeclarationLayer;
use crate::version::{Constraint, VersionScheme, split_inline};

use super::schema::{CollectionEntry, CollectionItem, RoleEntry, RoleItem};

/// Requirement on one of the fixed tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequirement {
    pub name: String,
    pub constraint: Constraint,
}

/// Requirement on a `namespace.leaf` collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRequirement {
    pub name: String,
    pub constraint: Constraint,
    pub layer: DeclarationLayer,
}

impl CollectionRequirement {
    pub fn from_entry(entry: &CollectionEntry, layer: DeclarationLayer) -> Result<Self, String> {
        let name = entry.name.trim().to_string();
        validate_collection_name(&name)?;
        let constraint = Constraint::parse(entry.version.as_deref().unwrap_or(""), VersionScheme::Semantic)
            .map_err(|e| format!("collection '{}': {}", name, e))?;
        Ok(Self {
            name,
            constraint,
            layer,
        })
    }

    /// Parse a compact `name<op><version>` string.
    pub fn from_compact(raw: &str, layer: DeclarationLayer) -> Result<Self, String> {
        let (name, constraint) = split_inline(raw);
        Self::from_entry(
            &CollectionEntry {
                name,
                version: Some(constraint),
            },
            layer,
        )
    }

    pub fn from_item(item: &CollectionItem, layer: DeclarationLayer) -> Result<Self, String> {
        match item {
            CollectionItem::Compact(raw) => Self::from_compact(raw, layer),
            CollectionItem::Entry(entry) => Self::from_entry(entry, layer),
        }
    }

    /// `(namespace, leaf)` halves of the name.
    pub fn split_name(&self) -> (&str, &str) {
        self.name.split_once('.').unwrap_or((&self.name, ""))
    }
}

/// Requirement on a role.
///
/// `constraint` is `None` when this layer did not specify a version, so the
/// merge engine can take it from a lower layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequirement {
    pub name: String,
    pub source: Option<String>,
    pub scm: Option<String>,
    pub constraint: Option<Constraint>,
    pub layer: DeclarationLayer,
}

impl RoleRequirement {
    pub fn from_entry(entry: &RoleEntry, layer: DeclarationLayer) -> Result<Self, String> {
        let declared_name = entry
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let parsed = match entry.src.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(src) => Some(RoleSource::parse(src, entry.scm.as_deref())?),
            None => None,
        };

        let name = match (declared_name, &parsed) {
            (Some(name), _) => name.to_string(),
            (None, Some(source)) => source.derived_name(),
            (None, None) => return Err("role entry has neither name nor src".to_string()),
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(format!("invalid role name '{}'", name));
        }

        let version = entry
            .version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| parsed.as_ref().and_then(|s| s.version.clone()));

        let constraint = version
            .map(|v| {
                Constraint::parse(&v, VersionScheme::Tag)
                    .map_err(|e| format!("role '{}': {}", name, e))
            })
            .transpose()?;

        let (source, scm) = match parsed {
            Some(source) if source.kind == SourceKind::Galaxy && source.url == name => (None, None),
            Some(source) => {
                let scm = (source.kind == SourceKind::Git).then(|| "git".to_string());
                (Some(source.url), scm)
            }
            None => (None, None),
        };

        Ok(Self {
            name,
            source,
            scm,
            constraint,
            layer,
        })
    }

    /// Parse a bare role name or src string, optionally with `,version`.
    pub fn from_compact(raw: &str, layer: DeclarationLayer) -> Result<Self, String> {
        let source = RoleSource::parse(raw, None)?;
        let entry = if source.kind == SourceKind::Galaxy {
            RoleEntry {
                name: Some(source.url),
                version: source.version,
                ..Default::default()
            }
        } else {
            RoleEntry {
                src: Some(raw.to_string()),
                ..Default::default()
            }
        };
        Self::from_entry(&entry, layer)
    }

    pub fn from_item(item: &RoleItem, layer: DeclarationLayer) -> Result<Self, String> {
        match item {
            RoleItem::Compact(raw) => Self::from_compact(raw, layer),
            RoleItem::Entry(entry) => Self::from_entry(entry, layer),
        }
    }

    /// Constraint to resolve with; unspecified means unconstrained.
    pub fn effective_constraint(&self) -> Constraint {
        self.constraint.clone().unwrap_or(Constraint::Any)
    }
}

/// A collection name must be `namespace.leaf` with exactly one dot.
pub fn validate_collection_name(name: &str) -> Result<(), String> {
    let valid_part =
        |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    match name.split_once('.') {
        Some((namespace, leaf)) if !leaf.contains('.') && valid_part(namespace) && valid_part(leaf) => {
            Ok(())
        }
        _ => Err(format!(
            "collection name '{}' must be '<namespace>.<leaf>' with exactly one dot",
            name
        )),
    }
}
