//! Declaration schemas for the three declaration sources
//!
//! - Project manifest: `rolelock.toml` (TOML)
//! - Scenario requirement file: `requirements.yml` (YAML)
//! - Embedded role metadata: `meta/main.yml` (YAML)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::compat::PythonDeclaration;
use crate::registry::RegistryOverrides;

/// The fixed set of auxiliary tooling packages, in lock order.
pub const TOOL_NAMES: [&str; 4] = ["ansible", "ansible-lint", "molecule", "yamllint"];

/// Root structure of `rolelock.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Interpreter version spec
    #[serde(default)]
    pub python: PythonDeclaration,

    /// One constraint per tool name; omitted tools are unconstrained
    #[serde(default)]
    pub tools: BTreeMap<String, String>,

    /// Collection declarations
    #[serde(default)]
    pub collections: Vec<CollectionEntry>,

    /// Role declarations
    #[serde(default)]
    pub roles: Vec<RoleEntry>,

    /// Registry overrides for this project
    #[serde(default)]
    pub registry: Option<RegistryOverrides>,

    /// Locations of the other declaration sources and the lock file
    #[serde(default)]
    pub paths: PathOverrides,
}

/// `{name, version}` collection declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// `{name, src, scm, version}` role declaration.
///
/// In requirement files `name` may be omitted and derived from `src`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEntry {
    #[serde(default, alias = "role")]
    pub name: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub scm: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Relative path overrides from the `[paths]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathOverrides {
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub meta: Option<String>,
    #[serde(default)]
    pub lock: Option<String>,
}

/// Collection item in a requirement file: a map or a compact string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CollectionItem {
    Compact(String),
    Entry(CollectionEntry),
}

/// Role item in a requirement file or metadata: a map or a bare name/src.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleItem {
    Compact(String),
    Entry(RoleEntry),
}

/// Scenario requirement file.
///
/// Lists are optional because YAML allows an empty `collections:` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequirementsFile {
    #[serde(default)]
    pub collections: Option<Vec<CollectionItem>>,
    #[serde(default)]
    pub roles: Option<Vec<RoleItem>>,
}

/// Embedded role metadata.
///
/// Only the fields consumed here are modelled; everything else in
/// `galaxy_info` is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleMetadata {
    #[serde(default)]
    pub collections: Option<Vec<String>>,
    #[serde(default)]
    pub dependencies: Option<Vec<RoleItem>>,
}

/// User-level configuration (`<config_dir>/rolelock/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub registry: RegistryOverrides,
}
