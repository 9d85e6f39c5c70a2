//! Project context for unified dependency injection.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::{
    Declarations, ProjectManifest, ProjectPaths, UserConfigStore, load_declarations,
    parse_manifest, paths::MANIFEST_FILE,
};
use crate::error::ResolveError;
use crate::git::GitTagLister;
use crate::lockfile::LockfileStore;
use crate::registry::{GalaxyClient, PypiClient, RegistryConfig, RegistryOverrides, http_client};
use crate::resolve::{ResolutionPlan, Resolver, RetryPolicy};

/// Resolver wired to the real registries.
pub type RegistryResolver = Resolver<PypiClient, GalaxyClient, GitTagLister>;

/// Unified project context for dependency injection.
///
/// Owns the project root and the user config location. Frontends create this
/// once and pass it to commands.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    project_root: PathBuf,
    user_config_dir: Option<PathBuf>,
}

/// A project whose manifest has been read.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub manifest: ProjectManifest,
    pub paths: ProjectPaths,
}

impl LoadedProject {
    /// Read the requirement and metadata layers.
    pub fn declarations(&self) -> Result<Declarations, ResolveError> {
        load_declarations(&self.manifest, &self.paths)
    }

    /// Declarations merged, interpreter pinned and tools adjusted.
    pub fn plan(&self) -> Result<ResolutionPlan, ResolveError> {
        ResolutionPlan::build(self.declarations()?)
    }

    pub fn lockfile_store(&self) -> LockfileStore {
        LockfileStore::new(self.paths.lock.clone())
    }
}

impl ProjectContext {
    /// Create a context using the platform config directory.
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            user_config_dir: dirs::config_dir(),
        }
    }

    /// Create context with a custom user config directory (for testing).
    ///
    /// `None` disables the user config layer.
    pub fn with_user_config_dir(project_root: PathBuf, user_config_dir: Option<PathBuf>) -> Self {
        Self {
            project_root,
            user_config_dir,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(MANIFEST_FILE)
    }

    /// Read the manifest and resolve every project path.
    pub fn load_project(&self) -> Result<LoadedProject, ResolveError> {
        let manifest = parse_manifest(&self.manifest_path())?;
        let paths = ProjectPaths::resolve(&self.project_root, &manifest.paths);
        Ok(LoadedProject { manifest, paths })
    }

    /// Get a UserConfigStore, if a user config directory is known.
    pub fn user_config_store(&self) -> Option<UserConfigStore> {
        self.user_config_dir
            .as_deref()
            .map(UserConfigStore::from_config_dir)
    }

    /// Effective registry settings: user config first, manifest on top.
    pub fn registry_config(&self, manifest: &ProjectManifest) -> anyhow::Result<RegistryConfig> {
        let mut overrides = match self.user_config_store() {
            Some(store) => store.load()?.registry,
            None => RegistryOverrides::default(),
        };
        if let Some(project) = &manifest.registry {
            overrides.merge(project.clone());
        }
        RegistryConfig::from_overrides(&overrides).context("Invalid registry configuration")
    }

    /// Retry policy for git tag listing.
    pub fn retry_policy(&self, config: &RegistryConfig) -> RetryPolicy {
        RetryPolicy::from_config(config)
    }

    /// Get a resolver backed by the configured registries.
    pub fn resolver(&self, config: &RegistryConfig) -> anyhow::Result<RegistryResolver> {
        let http = http_client(config)?;
        Ok(Resolver::new(
            PypiClient::new(http.clone(), config.pypi_url.clone()),
            GalaxyClient::new(http, config.galaxy_url.clone()),
            GitTagLister::new(),
        ))
    }
}
