//! Check command implementation.
//!
//! Compares the persisted lock against the current declarations without any
//! network access.

use std::path::PathBuf;

use crate::context::ProjectContext;
use crate::error::ResolveError;
use crate::lockfile::{check_freshness, plan_hash};

/// Freshness of the persisted lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Stored hash matches the declarations
    Fresh,
    /// Declarations changed since the lock was written
    Stale { persisted: String, current: String },
    /// No lock file exists yet
    Missing,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Result of a freshness check
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub lock_path: PathBuf,
    pub status: Freshness,
    /// Hash of the current declarations
    pub content_hash: String,
}

/// Check command orchestrator
#[derive(Debug)]
pub struct CheckCommand {
    ctx: ProjectContext,
}

impl CheckCommand {
    pub fn new(ctx: ProjectContext) -> Self {
        Self { ctx }
    }

    pub fn execute(&self) -> anyhow::Result<CheckReport> {
        let project = self.ctx.load_project()?;
        let plan = project.plan()?;
        let store = project.lockfile_store();
        let content_hash = plan_hash(&plan);

        let status = match store.load()? {
            None => Freshness::Missing,
            Some(lock) => match check_freshness(&plan, &lock) {
                Ok(()) => Freshness::Fresh,
                Err(ResolveError::StaleLock { persisted, current }) => {
                    Freshness::Stale { persisted, current }
                }
                Err(e) => return Err(e.into()),
            },
        };

        Ok(CheckReport {
            lock_path: store.path().to_path_buf(),
            status,
            content_hash,
        })
    }
}
