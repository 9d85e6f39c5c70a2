//! Declaration sources and layering
//!
//! Three layers feed every run, highest priority first:
//! - Project manifest (`rolelock.toml`)
//! - Scenario requirement file (`requirements.yml`)
//! - Embedded role metadata (`meta/main.yml`)

pub mod loader;
pub mod merge;
pub mod parser;
pub mod paths;
pub mod requirement;
pub mod schema;
pub mod store;

pub use loader::{Declarations, from_sources, load_declarations};
pub use merge::{MergedRequirements, merge_declarations};
pub use parser::{
    parse_manifest, parse_manifest_str, parse_metadata, parse_metadata_str, parse_requirements,
    parse_requirements_str,
};
pub use paths::{MANIFEST_FILE, ProjectPaths};
pub use requirement::{
    CollectionRequirement, RoleRequirement, ToolRequirement, validate_collection_name,
};
pub use schema::{
    CollectionEntry, CollectionItem, PathOverrides, ProjectManifest, RequirementsFile, RoleEntry,
    RoleItem, RoleMetadata, TOOL_NAMES, UserConfig,
};
pub use store::UserConfigStore;
