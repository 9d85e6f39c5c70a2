//! Lock command implementation.
//!
//! Loads the declaration layers, resolves every entity against the configured
//! registries and writes the lock document.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use crate::context::ProjectContext;
use crate::lockfile::LockDocument;
use crate::resolve::{CancelToken, ResolveContext};

/// Options for the lock command
#[derive(Debug, Clone, Default)]
pub struct LockOptions {
    /// Resolve and return the document without writing it
    pub dry_run: bool,
    /// Abort the whole run after this long
    pub timeout: Option<Duration>,
}

impl LockOptions {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of a lock run
#[derive(Debug, Clone)]
pub struct LockReport {
    /// The generated document
    pub document: LockDocument,
    /// Where the document lives (or would be written)
    pub lock_path: PathBuf,
    /// Whether the document was written
    pub written: bool,
    /// Interpreter, compatibility and degraded-resolution warnings
    pub warnings: Vec<String>,
}

/// Lock command orchestrator
#[derive(Debug)]
pub struct LockCommand {
    ctx: ProjectContext,
}

impl LockCommand {
    pub fn new(ctx: ProjectContext) -> Self {
        Self { ctx }
    }

    /// Resolve all declarations and persist the lock document.
    ///
    /// Nothing is written if any step fails or `cancel` fires.
    pub async fn execute(
        &self,
        options: &LockOptions,
        cancel: CancelToken,
    ) -> anyhow::Result<LockReport> {
        let project = self.ctx.load_project()?;
        let plan = project.plan()?;
        let registry = self.ctx.registry_config(&project.manifest)?;
        let resolver = self.ctx.resolver(&registry)?;

        let mut resolve_ctx = ResolveContext::new(cancel, self.ctx.retry_policy(&registry));
        if let Some(timeout) = options.timeout {
            resolve_ctx = resolve_ctx.with_timeout(timeout);
        }

        info!(
            python = %plan.interpreter.pinned,
            collections = plan.collections.len(),
            roles = plan.roles.len(),
            "Resolving declarations"
        );
        let resolution = resolver.resolve(&plan, &resolve_ctx).await?;

        let mut warnings = plan.warnings.clone();
        warnings.extend(resolution.warnings.iter().cloned());
        let document = LockDocument::generate(&plan, resolution);

        let store = project.lockfile_store();
        if !options.dry_run {
            store
                .save(&document)
                .with_context(|| format!("Failed to write lock file: {}", store.path().display()))?;
            info!("Wrote {}", store.path().display());
        }

        Ok(LockReport {
            document,
            lock_path: store.path().to_path_buf(),
            written: !options.dry_run,
            warnings,
        })
    }
}
