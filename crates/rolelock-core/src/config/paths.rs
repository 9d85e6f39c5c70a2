//! Declaration and lock file path resolution.

use std::path::{Path, PathBuf};

use super::schema::PathOverrides;

pub const MANIFEST_FILE: &str = "rolelock.toml";
pub const DEFAULT_REQUIREMENTS_FILE: &str = "requirements.yml";
pub const DEFAULT_METADATA_FILE: &str = "meta/main.yml";
pub const DEFAULT_LOCK_FILE: &str = "rolelock.lock.json";

/// Absolute locations of every file a run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub manifest: PathBuf,
    pub requirements: PathBuf,
    pub metadata: PathBuf,
    pub lock: PathBuf,
}

impl ProjectPaths {
    /// Resolve paths relative to `project_root`, applying `[paths]` overrides.
    pub fn resolve(project_root: &Path, overrides: &PathOverrides) -> Self {
        let relative = |value: &Option<String>, default: &str| {
            project_root.join(value.as_deref().unwrap_or(default))
        };
        Self {
            manifest: project_root.join(MANIFEST_FILE),
            requirements: relative(&overrides.requirements, DEFAULT_REQUIREMENTS_FILE),
            metadata: relative(&overrides.meta, DEFAULT_METADATA_FILE),
            lock: relative(&overrides.lock, DEFAULT_LOCK_FILE),
        }
    }
}

/// User-level config file under `config_dir`.
pub fn user_config_path(config_dir: &Path) -> PathBuf {
    config_dir.join("rolelock").join("config.toml")
}
