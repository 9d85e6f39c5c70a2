//! Show command implementation.

use std::path::PathBuf;

use crate::context::ProjectContext;
use crate::lockfile::LockDocument;

/// Result of reading the persisted lock
#[derive(Debug, Clone)]
pub struct ShowReport {
    pub lock_path: PathBuf,
    pub document: LockDocument,
    /// Integrity failure, if the entries no longer match the stored hash
    pub integrity_error: Option<String>,
}

/// Show command orchestrator
#[derive(Debug)]
pub struct ShowCommand {
    ctx: ProjectContext,
}

impl ShowCommand {
    pub fn new(ctx: ProjectContext) -> Self {
        Self { ctx }
    }

    pub fn execute(&self) -> anyhow::Result<ShowReport> {
        let project = self.ctx.load_project()?;
        let store = project.lockfile_store();
        let document = store.load()?.ok_or_else(|| {
            anyhow::anyhow!(
                "No lock file at {}. Run `rolelock lock` first.",
                store.path().display()
            )
        })?;
        let integrity_error = document.verify_integrity().err().map(|e| e.to_string());

        Ok(ShowReport {
            lock_path: store.path().to_path_buf(),
            document,
            integrity_error,
        })
    }
}
