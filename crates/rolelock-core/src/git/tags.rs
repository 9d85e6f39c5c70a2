//! Remote tag listing without cloning.

use std::collections::BTreeSet;

use git2::{Direction, Remote};
use tracing::debug;

use crate::error::ResolveError;
use crate::registry::{TagSource, source};

/// Lists tags on git remotes through libgit2.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitTagLister;

impl GitTagLister {
    pub fn new() -> Self {
        Self
    }

    /// Blocking listing of every tag advertised by `url`.
    ///
    /// Annotated tags appear twice in the advertisement (`refs/tags/x` and the
    /// peeled `refs/tags/x^{}`); both collapse to `x`.
    pub fn list_remote_tags(url: &str) -> Result<Vec<String>, git2::Error> {
        let mut remote = Remote::create_detached(url)?;
        remote.connect(Direction::Fetch)?;

        let tags: BTreeSet<String> = remote
            .list()?
            .iter()
            .filter_map(|head| head.name().strip_prefix("refs/tags/"))
            .map(|tag| tag.trim_end_matches("^{}").to_string())
            .collect();

        remote.disconnect()?;
        debug!(remote = url, count = tags.len(), "Listed remote tags");
        Ok(tags.into_iter().collect())
    }
}

impl TagSource for GitTagLister {
    async fn list_tags(&self, url: &str) -> Result<Vec<String>, ResolveError> {
        let owned = url.to_string();
        tokio::task::spawn_blocking(move || Self::list_remote_tags(&owned))
            .await
            .map_err(|e| ResolveError::registry(source::GIT, url, format!("tag listing task failed: {}", e)))?
            .map_err(|e| ResolveError::registry(source::GIT, url, e.message()))
    }
}
