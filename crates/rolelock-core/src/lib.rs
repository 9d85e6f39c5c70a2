//! Rolelock Core Library
//!
//! Resolves the interpreter, tooling packages, content collections and roles
//! a role project declares, and pins them in a deterministic lock document.

pub mod commands;
pub mod compat;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod lockfile;
pub mod registry;
pub mod resolve;
pub mod types;
pub mod version;

/// Re-exports of commonly used types
pub mod prelude {
    // Commands
    pub use crate::commands::{
        CheckCommand, CheckReport, Freshness, LockCommand, LockOptions, LockReport, ShowCommand,
        ShowReport,
    };
    pub use crate::context::ProjectContext;

    // Declarations
    pub use crate::config::{Declarations, MergedRequirements, ProjectManifest, merge_declarations};

    // Resolution
    pub use crate::resolve::{
        CancelToken, Canceller, ResolutionPlan, ResolveContext, Resolver, cancellation,
    };

    // Lock document
    pub use crate::lockfile::{LockDocument, LockfileStore, check_freshness};

    // Errors and shared types
    pub use crate::error::ResolveError;
    pub use crate::types::{DeclarationLayer, EntityKind};
    pub use crate::version::{Constraint, Version};
}
