//! Concurrent per-entity resolution against the registries.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::context::ResolveContext;
use super::plan::ResolutionPlan;
use crate::config::{CollectionRequirement, RoleRequirement, ToolRequirement};
use crate::error::ResolveError;
use crate::git::{RoleSource, SourceKind};
use crate::registry::{ContentIndex, PackageIndex, TagSource, source};
use crate::types::EntityKind;
use crate::version::{Candidate, Constraint, NoMatch, Selection, Version, select};

/// Sentinel recorded when an unconstrained git role has no usable tag.
pub const UNRESOLVED: &str = "unresolved";

/// One resolved entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub kind: EntityKind,
    pub name: String,
    /// Effective constraint, as displayed (`latest` when unconstrained).
    pub constraint: String,
    pub resolved_version: String,
    /// Registry source tag.
    pub source: String,
    /// Nested dependencies reported by the registry (collections only).
    pub dependencies: BTreeMap<String, String>,
    /// Role source locator and scm.
    pub src: Option<String>,
    pub scm: Option<String>,
}

impl ResolvedEntry {
    fn new(kind: EntityKind, name: &str, constraint: &Constraint, source: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            constraint: constraint.to_string(),
            resolved_version: String::new(),
            source: source.to_string(),
            dependencies: BTreeMap::new(),
            src: None,
            scm: None,
        }
    }

    fn resolved(mut self, version: impl Into<String>) -> Self {
        self.resolved_version = version.into();
        self
    }
}

/// Result of one entity task.
#[derive(Debug)]
struct Outcome {
    entry: ResolvedEntry,
    warnings: Vec<String>,
    /// The resolved version was selected from a registry listing.
    published: bool,
}

impl Outcome {
    fn clean(entry: ResolvedEntry) -> Self {
        Self {
            entry,
            warnings: Vec::new(),
            published: false,
        }
    }

    fn published(entry: ResolvedEntry) -> Self {
        Self {
            published: true,
            ..Self::clean(entry)
        }
    }

    fn degraded(entry: ResolvedEntry, warning: String) -> Self {
        warn!(kind = %entry.kind, name = %entry.name, "{}", warning);
        Self {
            entry,
            warnings: vec![warning],
            published: false,
        }
    }
}

/// Every resolved entity of a run, grouped and sorted by name.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub tools: Vec<ResolvedEntry>,
    pub collections: Vec<ResolvedEntry>,
    pub roles: Vec<ResolvedEntry>,
    /// Degraded-resolution warnings in entity order.
    pub warnings: Vec<String>,
}

/// Resolves a plan against a package index, a content index and git remotes.
pub struct Resolver<P, C, T> {
    packages: Arc<P>,
    content: Arc<C>,
    tags: Arc<T>,
}

impl<P, C, T> Resolver<P, C, T>
where
    P: PackageIndex,
    C: ContentIndex,
    T: TagSource,
{
    pub fn new(packages: P, content: C, tags: T) -> Self {
        Self::from_shared(Arc::new(packages), Arc::new(content), Arc::new(tags))
    }

    /// Build from clients that are also held elsewhere.
    pub fn from_shared(packages: Arc<P>, content: Arc<C>, tags: Arc<T>) -> Self {
        Self {
            packages,
            content,
            tags,
        }
    }

    /// Resolve every entity of `plan` concurrently.
    ///
    /// Entities are independent: each runs in its own task and results are
    /// merged only after all tasks finish. Registry failures degrade the
    /// affected entry; a fatal error or cancellation aborts the remaining
    /// tasks.
    pub async fn resolve(
        &self,
        plan: &ResolutionPlan,
        ctx: &ResolveContext,
    ) -> Result<Resolution, ResolveError> {
        ctx.check()?;
        let mut tasks = JoinSet::new();

        for tool in &plan.tools {
            let packages = Arc::clone(&self.packages);
            let ctx = ctx.clone();
            let tool = tool.clone();
            tasks.spawn(async move { resolve_tool(packages.as_ref(), &ctx, &tool).await });
        }
        for collection in &plan.collections {
            let content = Arc::clone(&self.content);
            let ctx = ctx.clone();
            let collection = collection.clone();
            tasks.spawn(async move { resolve_collection(content.as_ref(), &ctx, &collection).await });
        }
        for role in &plan.roles {
            let content = Arc::clone(&self.content);
            let tags = Arc::clone(&self.tags);
            let ctx = ctx.clone();
            let role = role.clone();
            tasks.spawn(
                async move { resolve_role(content.as_ref(), tags.as_ref(), &ctx, &role).await },
            );
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(ResolveError::Cancelled(format!("resolution task failed: {}", e))),
            };
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        outcomes.sort_by(|a, b| {
            (a.entry.kind, &a.entry.name).cmp(&(b.entry.kind, &b.entry.name))
        });

        let mut resolution = Resolution::default();
        for outcome in outcomes {
            resolution.warnings.extend(outcome.warnings);
            match outcome.entry.kind {
                EntityKind::Tool => resolution.tools.push(outcome.entry),
                EntityKind::Collection => resolution.collections.push(outcome.entry),
                EntityKind::Role => resolution.roles.push(outcome.entry),
            }
        }
        info!(
            tools = resolution.tools.len(),
            collections = resolution.collections.len(),
            roles = resolution.roles.len(),
            warnings = resolution.warnings.len(),
            "Resolution complete"
        );
        Ok(resolution)
    }
}

async fn resolve_tool<P: PackageIndex>(
    packages: &P,
    ctx: &ResolveContext,
    tool: &ToolRequirement,
) -> Result<Outcome, ResolveError> {
    let entry = ResolvedEntry::new(EntityKind::Tool, &tool.name, &tool.constraint, source::PYPI);
    let listed = ctx.guard(packages.package_versions(&tool.name)).await;
    resolve_listed(entry, &tool.constraint, listed, Candidate::from_release)
}

async fn resolve_collection<C: ContentIndex>(
    content: &C,
    ctx: &ResolveContext,
    collection: &CollectionRequirement,
) -> Result<Outcome, ResolveError> {
    let (namespace, leaf) = collection.split_name();
    let entry = ResolvedEntry::new(
        EntityKind::Collection,
        &collection.name,
        &collection.constraint,
        source::GALAXY,
    );
    let listed = ctx.guard(content.collection_versions(namespace, leaf)).await;
    let mut outcome = resolve_listed(entry, &collection.constraint, listed, Candidate::from_release)?;
    if !outcome.published {
        return Ok(outcome);
    }
    let version = outcome.entry.resolved_version.clone();
    match ctx
        .guard(content.collection_metadata(namespace, leaf, &version))
        .await
    {
        Ok(metadata) => outcome.entry.dependencies = dependencies_of(&metadata),
        Err(e @ ResolveError::Cancelled(_)) => return Err(e),
        Err(e) => {
            let warning = format!(
                "collection {} {}: metadata unavailable ({}); dependencies not recorded",
                collection.name, version, e
            );
            warn!(collection = %collection.name, "{}", warning);
            outcome.warnings.push(warning);
        }
    }
    Ok(outcome)
}

async fn resolve_role<C: ContentIndex, T: TagSource>(
    content: &C,
    tags: &T,
    ctx: &ResolveContext,
    role: &RoleRequirement,
) -> Result<Outcome, ResolveError> {
    let constraint = role.effective_constraint();
    let parsed = match role.source.as_deref() {
        Some(src) => Some(
            RoleSource::parse(src, role.scm.as_deref())
                .map_err(|e| ResolveError::declaration(format!("role {}", role.name), e))?,
        ),
        None => None,
    };

    let tag = match parsed.as_ref().map(|s| &s.kind) {
        Some(SourceKind::Git) => source::GIT,
        Some(SourceKind::Archive) => source::URL,
        Some(SourceKind::Galaxy) => source::GALAXY,
        None if role.name.contains('.') => source::GALAXY,
        None => source::LOCAL,
    };
    let mut entry = ResolvedEntry::new(EntityKind::Role, &role.name, &constraint, tag);
    entry.src = role.source.clone();
    entry.scm = role.scm.clone();

    match parsed {
        Some(source) if source.kind == SourceKind::Git => {
            resolve_git_role(tags, ctx, entry, &source.url, &constraint).await
        }
        Some(source) if source.kind == SourceKind::Galaxy => {
            resolve_galaxy_role(content, ctx, entry, &source.url, &constraint).await
        }
        None if role.name.contains('.') => {
            let name = role.name.clone();
            resolve_galaxy_role(content, ctx, entry, &name, &constraint).await
        }
        _ => {
            debug!(role = %role.name, "Role locked to its declared version");
            Ok(Outcome::clean(entry.resolved(constraint.literal())))
        }
    }
}

async fn resolve_galaxy_role<C: ContentIndex>(
    content: &C,
    ctx: &ResolveContext,
    entry: ResolvedEntry,
    galaxy_name: &str,
    constraint: &Constraint,
) -> Result<Outcome, ResolveError> {
    let (namespace, leaf) = galaxy_name.split_once('.').unwrap_or(("", galaxy_name));
    let listed = ctx.guard(content.role_versions(namespace, leaf)).await;
    resolve_listed(entry, constraint, listed, Candidate::from_tag)
}

async fn resolve_git_role<T: TagSource>(
    tags: &T,
    ctx: &ResolveContext,
    entry: ResolvedEntry,
    url: &str,
    constraint: &Constraint,
) -> Result<Outcome, ResolveError> {
    if let Some(pin) = constraint.opaque_pin() {
        debug!(role = %entry.name, pin, "Opaque pin locked without listing tags");
        return Ok(Outcome::clean(entry.resolved(pin)));
    }

    let listed = match list_tags_with_retry(tags, ctx, &entry.name, url).await {
        Ok(listed) => listed,
        Err(ResolveError::Cancelled(reason)) => return Err(ResolveError::Cancelled(reason)),
        Err(e) if constraint.is_any() => {
            let warning = format!(
                "role {}: tag listing failed after retries ({}); recorded as {}",
                entry.name, e, UNRESOLVED
            );
            return Ok(Outcome::degraded(entry.resolved(UNRESOLVED), warning));
        }
        Err(e) => return resolve_listed(entry, constraint, Err(e), Candidate::from_tag),
    };

    if constraint.is_any() {
        let outcome = match highest_tag(&listed) {
            Some(tag) => Outcome::published(entry.resolved(tag)),
            None => {
                let warning = format!(
                    "role {}: no release tags on {}; recorded as {}",
                    entry.name, url, UNRESOLVED
                );
                Outcome::degraded(entry.resolved(UNRESOLVED), warning)
            }
        };
        return Ok(outcome);
    }
    resolve_listed(entry, constraint, Ok(listed), Candidate::from_tag)
}

/// List tags, retrying transient failures with a fixed delay.
async fn list_tags_with_retry<T: TagSource>(
    tags: &T,
    ctx: &ResolveContext,
    role: &str,
    url: &str,
) -> Result<Vec<String>, ResolveError> {
    let policy = *ctx.retry();
    let mut attempt = 1;
    loop {
        let listing = async {
            tokio::time::timeout(policy.attempt_timeout, tags.list_tags(url))
                .await
                .unwrap_or_else(|_| {
                    Err(ResolveError::registry(
                        source::GIT,
                        url,
                        format!("timed out after {:?}", policy.attempt_timeout),
                    ))
                })
        };
        match ctx.guard(listing).await {
            Ok(listed) => return Ok(listed),
            Err(e) if e.is_transient() && attempt < policy.attempts => {
                warn!(
                    role,
                    attempt,
                    max_attempts = policy.attempts,
                    error = %e,
                    "Tag listing failed, retrying"
                );
                ctx.pause().await?;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Highest non-branch tag: semantic tags by version, else opaque tags by name.
fn highest_tag(listed: &[String]) -> Option<String> {
    let candidates: Vec<Candidate> = listed.iter().filter_map(|t| Candidate::from_tag(t)).collect();
    if let Ok(selection) = select(&candidates, &Constraint::Any) {
        return Some(selection.version().to_string());
    }
    listed
        .iter()
        .filter(|t| !crate::version::is_branch_like(t) && !Version::from_tag(t).is_semantic())
        .max()
        .cloned()
}

/// Apply the shared listing policy to a registry result.
///
/// - Registry failure: degrade to the raw constraint string.
/// - Unconstrained with nothing published: degrade to `latest`.
/// - `>=` with nothing satisfying: fall back to the literal bound.
/// - Any other operator with nothing satisfying: fatal.
fn resolve_listed(
    entry: ResolvedEntry,
    constraint: &Constraint,
    listed: Result<Vec<String>, ResolveError>,
    to_candidate: fn(&str) -> Option<Candidate>,
) -> Result<Outcome, ResolveError> {
    let listed = match listed {
        Ok(listed) => listed,
        Err(ResolveError::Cancelled(reason)) => return Err(ResolveError::Cancelled(reason)),
        Err(e) => {
            let degraded = constraint.to_string();
            let warning = format!(
                "{} {}: registry unavailable ({}); recorded constraint {} as resolved",
                entry.kind, entry.name, e, degraded
            );
            return Ok(Outcome::degraded(entry.resolved(degraded), warning));
        }
    };

    let candidates: Vec<Candidate> = listed.iter().filter_map(|v| to_candidate(v)).collect();
    match select(&candidates, constraint) {
        Ok(Selection::Matched(version)) => {
            debug!(kind = %entry.kind, name = %entry.name, %version, "Resolved");
            Ok(Outcome::published(entry.resolved(version)))
        }
        Ok(Selection::Fallback(version)) => {
            let warning = format!(
                "{} {}: no published version satisfies {}; fell back to {}",
                entry.kind, entry.name, constraint, version
            );
            Ok(Outcome::degraded(entry.resolved(version), warning))
        }
        Err(NoMatch) if constraint.is_any() => {
            let warning = format!(
                "{} {}: registry lists no versions; recorded as latest",
                entry.kind, entry.name
            );
            Ok(Outcome::degraded(entry.resolved(constraint.literal()), warning))
        }
        Err(NoMatch) => Err(ResolveError::NoSatisfyingVersion {
            kind: entry.kind,
            name: entry.name,
            constraint: constraint.to_string(),
        }),
    }
}

/// String-valued entries of `metadata.dependencies`.
fn dependencies_of(metadata: &Map<String, Value>) -> BTreeMap<String, String> {
    metadata
        .get("dependencies")
        .and_then(Value::as_object)
        .map(|deps| {
            deps.iter()
                .map(|(name, spec)| {
                    let spec = spec
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| spec.to_string());
                    (name.clone(), spec)
                })
                .collect()
        })
        .unwrap_or_default()
}
