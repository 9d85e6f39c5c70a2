//! Lock document types.
//!
//! The persisted document pins the interpreter and every tool, collection and
//! role, and carries a content hash of the declarations it was built from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hash::{HashRecord, content_hash, digest_lines};
use crate::compat::InterpreterSpec;
use crate::error::ResolveError;
use crate::resolve::{Resolution, ResolutionPlan, ResolvedEntry};
use crate::types::EntityKind;

/// Current lock document format.
pub const LOCK_FORMAT_VERSION: u32 = 1;

/// Persisted lock document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDocument {
    /// Lock document format version
    pub format_version: u32,

    /// Timestamp when the document was generated; not part of the hash
    pub generated_at: DateTime<Utc>,

    /// BLAKE3 hex digest of the declarations
    pub content_hash: String,

    /// BLAKE3 hex digest of every locked field, for hand-edit detection
    #[serde(default)]
    pub integrity_hash: String,

    /// Pinned interpreter
    pub python: InterpreterSpec,

    /// Locked tools, sorted by name
    #[serde(default)]
    pub tools: Vec<LockedTool>,

    /// Locked collections, sorted by name
    #[serde(default)]
    pub collections: Vec<LockedCollection>,

    /// Locked roles, sorted by name
    #[serde(default)]
    pub roles: Vec<LockedRole>,
}

/// A locked tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedTool {
    pub name: String,
    pub constraint: String,
    pub resolved_version: String,
    pub source: String,
}

/// A locked collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedCollection {
    pub name: String,
    pub constraint: String,
    pub resolved_version: String,
    pub source: String,

    /// Nested collection dependencies reported by the index
    #[serde(
        rename = "python_deps",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dependencies: BTreeMap<String, String>,
}

/// A locked role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedRole {
    pub name: String,
    pub constraint: String,
    pub resolved_version: String,
    pub source: String,

    /// Source locator for git and archive roles
    #[serde(rename = "src_url", default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm: Option<String>,
}

impl From<ResolvedEntry> for LockedTool {
    fn from(entry: ResolvedEntry) -> Self {
        Self {
            name: entry.name,
            constraint: entry.constraint,
            resolved_version: entry.resolved_version,
            source: entry.source,
        }
    }
}

impl From<ResolvedEntry> for LockedCollection {
    fn from(entry: ResolvedEntry) -> Self {
        Self {
            name: entry.name,
            constraint: entry.constraint,
            resolved_version: entry.resolved_version,
            source: entry.source,
            dependencies: entry.dependencies,
        }
    }
}

impl From<ResolvedEntry> for LockedRole {
    fn from(entry: ResolvedEntry) -> Self {
        Self {
            name: entry.name,
            constraint: entry.constraint,
            resolved_version: entry.resolved_version,
            source: entry.source,
            src: entry.src,
            scm: entry.scm,
        }
    }
}

impl LockDocument {
    /// Assemble a document from a plan and its resolution.
    pub fn generate(plan: &ResolutionPlan, resolution: Resolution) -> Self {
        let mut document = Self {
            format_version: LOCK_FORMAT_VERSION,
            generated_at: Utc::now(),
            content_hash: plan_hash(plan),
            integrity_hash: String::new(),
            python: plan.interpreter.clone(),
            tools: resolution.tools.into_iter().map(LockedTool::from).collect(),
            collections: resolution
                .collections
                .into_iter()
                .map(LockedCollection::from)
                .collect(),
            roles: resolution.roles.into_iter().map(LockedRole::from).collect(),
        };
        document.sort_entries();
        document.integrity_hash = document.recompute_integrity_hash();
        document
    }

    fn sort_entries(&mut self) {
        self.tools.sort_by(|a, b| a.name.cmp(&b.name));
        self.collections.sort_by(|a, b| a.name.cmp(&b.name));
        self.roles.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Hash records of this document's own entries.
    pub fn hash_records(&self) -> Vec<HashRecord> {
        let tools = self
            .tools
            .iter()
            .map(|t| HashRecord::new(EntityKind::Tool, &t.name, &t.constraint));
        let collections = self
            .collections
            .iter()
            .map(|c| HashRecord::new(EntityKind::Collection, &c.name, &c.constraint));
        let roles = self.roles.iter().map(|r| {
            HashRecord::new(EntityKind::Role, &r.name, &r.constraint)
                .with_locator(r.src.as_deref(), r.scm.as_deref())
        });
        tools.chain(collections).chain(roles).collect()
    }

    /// Recompute the content hash from the document's entries.
    pub fn recompute_hash(&self) -> String {
        content_hash(&self.python, self.hash_records())
    }

    /// Digest over every persisted field except the timestamp and the hashes.
    pub fn recompute_integrity_hash(&self) -> String {
        let python = &self.python;
        let mut lines = vec![
            format!("format:{}", self.format_version),
            format!(
                "python:{}:{}:{}:{}",
                python.min,
                python.max,
                python.pinned,
                python.additional.join(",")
            ),
        ];
        for t in &self.tools {
            lines.push(format!(
                "tool:{}:{}:{}:{}",
                t.name, t.constraint, t.resolved_version, t.source
            ));
        }
        for c in &self.collections {
            let deps: Vec<String> = c
                .dependencies
                .iter()
                .map(|(name, constraint)| format!("{}={}", name, constraint))
                .collect();
            lines.push(format!(
                "collection:{}:{}:{}:{}:{}",
                c.name,
                c.constraint,
                c.resolved_version,
                c.source,
                deps.join(",")
            ));
        }
        for r in &self.roles {
            lines.push(format!(
                "role:{}:{}:{}:{}:{}:{}",
                r.name,
                r.constraint,
                r.resolved_version,
                r.source,
                r.src.as_deref().unwrap_or_default(),
                r.scm.as_deref().unwrap_or_default()
            ));
        }
        digest_lines(lines)
    }

    /// Recompute both hashes from the document's own entries.
    pub fn seal(&mut self) {
        self.content_hash = self.recompute_hash();
        self.integrity_hash = self.recompute_integrity_hash();
    }

    /// Check the stored hashes against the entries, detecting hand edits.
    pub fn verify_integrity(&self) -> Result<(), ResolveError> {
        let recomputed = self.recompute_hash();
        if recomputed != self.content_hash {
            return Err(ResolveError::LockFormat(format!(
                "content hash {} does not match entries (expected {})",
                self.content_hash, recomputed
            )));
        }
        let recomputed = self.recompute_integrity_hash();
        if recomputed != self.integrity_hash {
            return Err(ResolveError::LockFormat(format!(
                "integrity hash {} does not match locked entries (expected {})",
                self.integrity_hash, recomputed
            )));
        }
        Ok(())
    }

    /// Validate format version and interpreter pin.
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.format_version != LOCK_FORMAT_VERSION {
            return Err(ResolveError::LockFormat(format!(
                "unsupported format_version {}",
                self.format_version
            )));
        }
        self.python
            .validate()
            .map_err(|e| ResolveError::LockFormat(e.to_string()))
    }

    /// Serialize to pretty JSON with a trailing newline.
    pub fn to_json_pretty(&self) -> Result<String, ResolveError> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| ResolveError::LockFormat(format!("failed to serialize: {}", e)))?;
        json.push('\n');
        Ok(json)
    }
}

/// Content hash of a plan's effective declarations.
pub fn plan_hash(plan: &ResolutionPlan) -> String {
    let tools = plan
        .tools
        .iter()
        .map(|t| HashRecord::new(EntityKind::Tool, &t.name, &t.constraint.to_string()));
    let collections = plan.collections.iter().map(|c| {
        HashRecord::new(EntityKind::Collection, &c.name, &c.constraint.to_string())
    });
    let roles = plan.roles.iter().map(|r| {
        HashRecord::new(EntityKind::Role, &r.name, &r.effective_constraint().to_string())
            .with_locator(r.source.as_deref(), r.scm.as_deref())
    });
    content_hash(&plan.interpreter, tools.chain(collections).chain(roles))
}
