//! Python package index client.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{PackageIndex, source};
use crate::error::ResolveError;

/// JSON API response; only the release map is read.
#[derive(Debug, Deserialize)]
struct ProjectResponse {
    #[serde(default)]
    releases: BTreeMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    yanked: bool,
}

/// Client for `GET {base}/pypi/{name}/json`.
#[derive(Debug, Clone)]
pub struct PypiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PypiClient {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn project_url(&self, name: &str) -> Result<Url, ResolveError> {
        self.base_url
            .join(&format!("pypi/{}/json", name))
            .map_err(|e| ResolveError::registry(source::PYPI, name, e))
    }
}

impl PackageIndex for PypiClient {
    async fn package_versions(&self, name: &str) -> Result<Vec<String>, ResolveError> {
        let url = self.project_url(name)?;
        debug!("Fetching package versions from {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ResolveError::registry(source::PYPI, name, e))?;

        if !response.status().is_success() {
            return Err(ResolveError::registry(
                source::PYPI,
                name,
                format!("HTTP {} from {}", response.status(), url),
            ));
        }

        let project: ProjectResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::registry(source::PYPI, name, format!("invalid response: {}", e)))?;

        Ok(project
            .releases
            .into_iter()
            .filter(|(_, files)| files.is_empty() || files.iter().any(|f| !f.yanked))
            .map(|(version, _)| version)
            .collect())
    }
}
