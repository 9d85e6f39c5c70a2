//! User-level registry config store.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::parser;
use super::paths::user_config_path;
use super::schema::UserConfig;

#[derive(Debug, Clone)]
pub struct UserConfigStore {
    config_path: PathBuf,
}

impl UserConfigStore {
    pub fn from_config_dir(config_dir: &Path) -> Self {
        Self {
            config_path: user_config_path(config_dir),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the user config; a missing file yields defaults.
    pub fn load(&self) -> anyhow::Result<UserConfig> {
        if !self.config_path.exists() {
            return Ok(UserConfig::default());
        }
        let content = std::fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;
        parser::parse_user_config_str(&content)
            .map_err(|message| anyhow::anyhow!(message))
            .with_context(|| format!("Failed to parse config file: {}", self.config_path.display()))
    }
}
