//! Registry configuration schema
//!
//! Endpoints, timeouts and git retry policy. A user-level config provides the
//! base layer and the project manifest overrides it field by field.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_PYPI_URL: &str = "https://pypi.org";
pub const DEFAULT_GALAXY_URL: &str = "https://galaxy.ansible.com";

/// Partial registry settings as written in a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryOverrides {
    #[serde(default)]
    pub pypi_url: Option<String>,
    #[serde(default)]
    pub galaxy_url: Option<String>,
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default)]
    pub git_timeout_secs: Option<u64>,
    #[serde(default)]
    pub git_retries: Option<u32>,
    #[serde(default)]
    pub git_retry_delay_ms: Option<u64>,
}

impl RegistryOverrides {
    /// Merge another layer on top of this one; set fields in `other` win.
    pub fn merge(&mut self, other: RegistryOverrides) {
        if other.pypi_url.is_some() {
            self.pypi_url = other.pypi_url;
        }
        if other.galaxy_url.is_some() {
            self.galaxy_url = other.galaxy_url;
        }
        if other.http_timeout_secs.is_some() {
            self.http_timeout_secs = other.http_timeout_secs;
        }
        if other.git_timeout_secs.is_some() {
            self.git_timeout_secs = other.git_timeout_secs;
        }
        if other.git_retries.is_some() {
            self.git_retries = other.git_retries;
        }
        if other.git_retry_delay_ms.is_some() {
            self.git_retry_delay_ms = other.git_retry_delay_ms;
        }
    }
}

/// Effective registry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Python package index base URL
    pub pypi_url: Url,
    /// Collection and role index base URL
    pub galaxy_url: Url,
    /// Bound for each registry HTTP request
    pub http_timeout: Duration,
    /// Bound for each git tag listing attempt
    pub git_timeout: Duration,
    /// Attempts for git tag listing, including the first
    pub git_retries: u32,
    /// Fixed delay between git attempts
    pub git_retry_delay: Duration,
}

impl RegistryConfig {
    /// Build effective settings from merged overrides.
    pub fn from_overrides(overrides: &RegistryOverrides) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let config = Self {
            pypi_url: parse_base_url(overrides.pypi_url.as_deref(), defaults.pypi_url)?,
            galaxy_url: parse_base_url(overrides.galaxy_url.as_deref(), defaults.galaxy_url)?,
            http_timeout: overrides
                .http_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            git_timeout: overrides
                .git_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.git_timeout),
            git_retries: overrides.git_retries.unwrap_or(defaults.git_retries),
            git_retry_delay: overrides
                .git_retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.git_retry_delay),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        for url in [&self.pypi_url, &self.galaxy_url] {
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("Registry URL must be http(s): {}", url);
            }
        }
        if self.http_timeout.is_zero() || self.git_timeout.is_zero() {
            anyhow::bail!("Registry timeouts must be greater than zero");
        }
        if self.git_retries == 0 {
            anyhow::bail!("git_retries must be at least 1");
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            pypi_url: Url::parse(DEFAULT_PYPI_URL).expect("default PyPI URL is valid"),
            galaxy_url: Url::parse(DEFAULT_GALAXY_URL).expect("default Galaxy URL is valid"),
            http_timeout: Duration::from_secs(30),
            git_timeout: Duration::from_secs(10),
            git_retries: 3,
            git_retry_delay: Duration::from_millis(2000),
        }
    }
}

/// Parse a base URL, ensuring a trailing slash so `Url::join` keeps the path.
fn parse_base_url(raw: Option<&str>, default: Url) -> anyhow::Result<Url> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| anyhow::anyhow!("Invalid registry URL '{}': {}", raw, e))
}
