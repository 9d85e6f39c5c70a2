//! Role source locator parsing.

use serde::{Deserialize, Serialize};

/// How a role source is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Git remote with tag-based versions
    Git,
    /// Archive or other non-git URL; locked to the declared version as-is
    Archive,
    /// `namespace.name` looked up in the role index
    Galaxy,
}

/// Parsed role source locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSource {
    /// Remote URL, archive URL or index name
    pub url: String,
    /// Fetch mechanism
    pub kind: SourceKind,
    /// Version embedded as `src,version`
    pub version: Option<String>,
    /// Name embedded as `src,version,name`
    pub name: Option<String>,
}

impl RoleSource {
    /// Parse a role `src` value together with its optional `scm` field.
    ///
    /// Supports formats:
    /// - `https://github.com/org/repo.git`
    /// - `git+https://github.com/org/repo,v1.2.0`
    /// - `git@github.com:org/repo.git`
    /// - `github:org/repo`
    /// - `https://example.com/role.tar.gz`
    /// - `namespace.name`
    pub fn parse(src: &str, scm: Option<&str>) -> Result<Self, String> {
        let raw = src.trim();
        if raw.is_empty() {
            return Err("role src is empty".to_string());
        }

        let (raw, git_prefix) = match raw.strip_prefix("git+") {
            Some(rest) => (rest, true),
            None => (raw, false),
        };

        let mut parts = raw.splitn(3, ',').map(str::trim);
        let locator = parts.next().unwrap_or_default();
        let version = parts.next().filter(|v| !v.is_empty()).map(str::to_string);
        let name = parts.next().filter(|n| !n.is_empty()).map(str::to_string);

        if locator.is_empty() {
            return Err(format!("role src '{}' has no locator", src));
        }

        let (url, shorthand) = match locator.strip_prefix("github:") {
            Some(path) => (Self::expand_github_shorthand(path)?, true),
            None => (locator.to_string(), false),
        };

        let kind = match scm.map(str::trim).filter(|s| !s.is_empty()) {
            Some("git") => SourceKind::Git,
            Some(other) => {
                return Err(format!("unsupported scm '{}' for role src '{}'", other, src));
            }
            None if git_prefix || shorthand || Self::looks_like_git(&url) => SourceKind::Git,
            None if url.contains("://") => SourceKind::Archive,
            None => SourceKind::Galaxy,
        };

        Ok(Self {
            url,
            kind,
            version,
            name,
        })
    }

    pub fn is_git(&self) -> bool {
        self.kind == SourceKind::Git
    }

    /// Role name implied by the locator: the embedded name, else the last
    /// path segment without `.git` or archive extensions.
    pub fn derived_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if self.kind == SourceKind::Galaxy {
            return self.url.clone();
        }
        let segment = self
            .url
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .unwrap_or(&self.url);
        [".git", ".tar.gz", ".tgz", ".zip"]
            .iter()
            .find_map(|ext| segment.strip_suffix(ext))
            .unwrap_or(segment)
            .to_string()
    }

    /// Expand github shorthand like "org/repo" to a full URL.
    fn expand_github_shorthand(path: &str) -> Result<String, String> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(format!("Invalid GitHub repo format: {}", path));
        }
        Ok(format!("https://github.com/{}/{}", parts[0], parts[1]))
    }

    fn looks_like_git(url: &str) -> bool {
        url.ends_with(".git")
            || url.starts_with("git@")
            || url.starts_with("git://")
            || url.starts_with("ssh://")
            || url.starts_with("file://")
    }
}
