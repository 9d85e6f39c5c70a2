//! Declaration loader
//!
//! Reads the three declaration sources and normalizes them into canonical
//! requirement records tagged with the layer they came from.

use std::collections::BTreeMap;

use tracing::debug;

use super::parser;
use super::paths::ProjectPaths;
use super::requirement::{CollectionRequirement, RoleRequirement};
use super::schema::{ProjectManifest, RequirementsFile, RoleMetadata};
use crate::compat::PythonDeclaration;
use crate::error::ResolveError;
use crate::types::DeclarationLayer;
use crate::version::{Constraint, VersionScheme};

/// Every declaration from every layer, before merging.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    pub python: PythonDeclaration,
    pub tools: BTreeMap<String, Constraint>,
    pub collections: Vec<CollectionRequirement>,
    pub roles: Vec<RoleRequirement>,
}

/// Read and normalize all declaration sources.
pub fn load_declarations(
    manifest: &ProjectManifest,
    paths: &ProjectPaths,
) -> Result<Declarations, ResolveError> {
    let requirements = parser::parse_requirements(&paths.requirements)?;
    let metadata = parser::parse_metadata(&paths.metadata)?;
    from_sources(manifest, &requirements, &metadata)
}

/// Normalize already-parsed sources.
pub fn from_sources(
    manifest: &ProjectManifest,
    requirements: &RequirementsFile,
    metadata: &RoleMetadata,
) -> Result<Declarations, ResolveError> {
    let mut declarations = Declarations {
        python: manifest.python.clone(),
        ..Default::default()
    };

    for (name, raw) in &manifest.tools {
        let constraint = Constraint::parse(raw, VersionScheme::Semantic).map_err(|e| {
            ResolveError::declaration(DeclarationLayer::Manifest.as_str(), format!("tool '{}': {}", name, e))
        })?;
        declarations.tools.insert(name.clone(), constraint);
    }

    let manifest_layer = DeclarationLayer::Manifest;
    for entry in &manifest.collections {
        let record = CollectionRequirement::from_entry(entry, manifest_layer)
            .map_err(|e| ResolveError::declaration(manifest_layer.as_str(), e))?;
        declarations.collections.push(record);
    }
    for entry in &manifest.roles {
        let record = RoleRequirement::from_entry(entry, manifest_layer)
            .map_err(|e| ResolveError::declaration(manifest_layer.as_str(), e))?;
        declarations.roles.push(record);
    }

    let requirements_layer = DeclarationLayer::Requirements;
    for item in requirements.collections.iter().flatten() {
        let record = CollectionRequirement::from_item(item, requirements_layer)
            .map_err(|e| ResolveError::declaration(requirements_layer.as_str(), e))?;
        declarations.collections.push(record);
    }
    for item in requirements.roles.iter().flatten() {
        let record = RoleRequirement::from_item(item, requirements_layer)
            .map_err(|e| ResolveError::declaration(requirements_layer.as_str(), e))?;
        declarations.roles.push(record);
    }

    let metadata_layer = DeclarationLayer::Metadata;
    for raw in metadata.collections.iter().flatten() {
        let record = CollectionRequirement::from_compact(raw, metadata_layer)
            .map_err(|e| ResolveError::declaration(metadata_layer.as_str(), e))?;
        declarations.collections.push(record);
    }
    for item in metadata.dependencies.iter().flatten() {
        let record = RoleRequirement::from_item(item, metadata_layer)
            .map_err(|e| ResolveError::declaration(metadata_layer.as_str(), e))?;
        declarations.roles.push(record);
    }

    debug!(
        tools = declarations.tools.len(),
        collections = declarations.collections.len(),
        roles = declarations.roles.len(),
        "Loaded declarations"
    );
    Ok(declarations)
}
