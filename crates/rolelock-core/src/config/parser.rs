//! Parsers for the three declaration sources with helpful error messages

use std::path::Path;

use super::schema::{ProjectManifest, RequirementsFile, RoleMetadata, TOOL_NAMES, UserConfig};
use crate::error::ResolveError;

/// Parse `rolelock.toml`. A missing manifest is an error.
pub fn parse_manifest(path: &Path) -> Result<ProjectManifest, ResolveError> {
    let origin = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| {
        ResolveError::declaration(&origin, format!("Failed to read project manifest: {}", e))
    })?;
    parse_manifest_str(&content).map_err(|message| ResolveError::declaration(origin, message))
}

/// Parse project manifest content from string
pub fn parse_manifest_str(content: &str) -> Result<ProjectManifest, String> {
    let manifest: ProjectManifest =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Parse the scenario requirement file; a missing file declares nothing.
pub fn parse_requirements(path: &Path) -> Result<RequirementsFile, ResolveError> {
    let Some(content) = read_optional(path)? else {
        tracing::debug!("No requirement file at {}", path.display());
        return Ok(RequirementsFile::default());
    };
    parse_yaml(&content).map_err(|message| ResolveError::declaration(path.display().to_string(), message))
}

/// Parse requirement file content from string
pub fn parse_requirements_str(content: &str) -> Result<RequirementsFile, String> {
    parse_yaml(content)
}

/// Parse embedded role metadata; a missing file declares nothing.
pub fn parse_metadata(path: &Path) -> Result<RoleMetadata, ResolveError> {
    let Some(content) = read_optional(path)? else {
        tracing::debug!("No role metadata at {}", path.display());
        return Ok(RoleMetadata::default());
    };
    parse_yaml(&content).map_err(|message| ResolveError::declaration(path.display().to_string(), message))
}

/// Parse role metadata content from string
pub fn parse_metadata_str(content: &str) -> Result<RoleMetadata, String> {
    parse_yaml(content)
}

/// Parse the user-level config file.
pub fn parse_user_config_str(content: &str) -> Result<UserConfig, String> {
    toml::from_str(content).map_err(|e| enhance_toml_error(e, content))
}

fn read_optional(path: &Path) -> Result<Option<String>, ResolveError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ResolveError::declaration(
            path.display().to_string(),
            format!("Failed to read file: {}", e),
        )),
    }
}

/// Deserialize YAML, treating a blank or comment-only document as empty.
fn parse_yaml<T>(content: &str) -> Result<T, String>
where
    T: serde::de::DeserializeOwned + Default,
{
    let has_content = content
        .lines()
        .map(str::trim)
        .any(|line| !line.is_empty() && !line.starts_with('#') && line != "---");
    if !has_content {
        return Ok(T::default());
    }
    serde_yaml::from_str(content).map_err(|e| match e.location() {
        Some(location) => format!(
            "YAML parsing error at line {}:\n{}\n\nError: {}",
            location.line(),
            get_line_context(content, location.line()),
            e
        ),
        None => format!("YAML parsing error: {}", e),
    })
}

/// Enhance TOML parsing errors with helpful context
fn enhance_toml_error(error: toml::de::Error, content: &str) -> String {
    let error_msg = error.message().to_string();
    let line_hint = error
        .span()
        .and_then(|span| content.get(..span.start))
        .map(|before| before.matches('\n').count() + 1);

    match line_hint {
        Some(line_num) => format!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            error_msg
        ),
        None => format!("TOML parsing error: {}", error_msg),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 2).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate the manifest after parsing
fn validate_manifest(manifest: &ProjectManifest) -> Result<(), String> {
    if let Some(unknown) = manifest
        .tools
        .keys()
        .find(|name| !TOOL_NAMES.contains(&name.as_str()))
    {
        return Err(format!(
            "unknown tool '{}' in [tools] (expected one of: {})",
            unknown,
            TOOL_NAMES.join(", ")
        ));
    }
    Ok(())
}
