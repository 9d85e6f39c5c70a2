//! Registry clients
//!
//! Version listings come from three places: the Python package index for
//! tools, the content index for collections and index-hosted roles, and git
//! remotes for git-sourced roles. Each is a trait so the resolver can run
//! against in-memory fakes.

pub mod galaxy;
pub mod pypi;
pub mod schema;

use std::future::Future;

use serde_json::{Map, Value};

use crate::error::ResolveError;

pub use galaxy::GalaxyClient;
pub use pypi::PypiClient;
pub use schema::{DEFAULT_GALAXY_URL, DEFAULT_PYPI_URL, RegistryConfig, RegistryOverrides};

/// Registry source tags recorded in lock entries.
pub mod source {
    pub const PYPI: &str = "pypi";
    pub const GALAXY: &str = "galaxy";
    pub const GIT: &str = "git";
    pub const URL: &str = "url";
    pub const LOCAL: &str = "local";
}

/// Published versions of Python packages.
pub trait PackageIndex: Send + Sync + 'static {
    /// Every non-yanked version string for `name`, in registry order.
    fn package_versions(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, ResolveError>> + Send;
}

/// Published versions and metadata of collections and index-hosted roles.
pub trait ContentIndex: Send + Sync + 'static {
    /// Every published version of `namespace.name`.
    fn collection_versions(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, ResolveError>> + Send;

    /// Opaque metadata object for one collection version.
    fn collection_metadata(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> impl Future<Output = Result<Map<String, Value>, ResolveError>> + Send;

    /// Every published version of the role `namespace.name`.
    fn role_versions(
        &self,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, ResolveError>> + Send;
}

/// Tag listing for git remotes.
pub trait TagSource: Send + Sync + 'static {
    /// Every tag name on the remote, without `refs/tags/` or peel suffixes.
    fn list_tags(&self, url: &str)
    -> impl Future<Output = Result<Vec<String>, ResolveError>> + Send;
}

/// Build the shared HTTP client used by every registry.
pub fn http_client(config: &RegistryConfig) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("rolelock/", env!("CARGO_PKG_VERSION")))
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}
