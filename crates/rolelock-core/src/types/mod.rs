//! Shared core types used across declaration, resolution and lockfile layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Class of a resolvable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// One of the fixed auxiliary tooling packages.
    Tool,
    /// A `namespace.leaf` content collection.
    Collection,
    /// A reusable role, optionally git-sourced.
    Role,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tool => "tool",
            EntityKind::Collection => "collection",
            EntityKind::Role => "role",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration source layers, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeclarationLayer {
    /// Project manifest (`rolelock.toml`).
    Manifest,
    /// Scenario requirement file (`requirements.yml`).
    Requirements,
    /// Embedded role metadata (`meta/main.yml`).
    Metadata,
}

impl DeclarationLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationLayer::Manifest => "manifest",
            DeclarationLayer::Requirements => "requirements",
            DeclarationLayer::Metadata => "metadata",
        }
    }
}

impl fmt::Display for DeclarationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
