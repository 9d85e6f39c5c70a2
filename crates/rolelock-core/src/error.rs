//! Error taxonomy for declaration loading, resolution and locking.

use thiserror::Error;

use crate::types::EntityKind;

/// Errors raised by the resolution engine.
///
/// `RegistryUnavailable` never escapes a full run: the resolver turns it into a
/// degraded entry plus a warning. It is still a distinct variant so registry
/// clients can report it precisely.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("declaration error in {origin}: {message}")]
    DeclarationParse { origin: String, message: String },

    #[error("registry {registry} unavailable for '{name}': {reason}")]
    RegistryUnavailable {
        registry: String,
        name: String,
        reason: String,
    },

    #[error("python {field} '{value}' is not supported (allowed: {allowed})")]
    IncompatibleVersion {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("no version of {kind} '{name}' satisfies '{constraint}'")]
    NoSatisfyingVersion {
        kind: EntityKind,
        name: String,
        constraint: String,
    },

    #[error("lock file is stale: persisted hash {persisted}, declarations hash {current}")]
    StaleLock { persisted: String, current: String },

    #[error("resolution cancelled: {0}")]
    Cancelled(String),

    #[error("lock file format error: {0}")]
    LockFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolveError {
    /// Build a declaration error for the given origin (file or layer name).
    pub fn declaration(origin: impl Into<String>, message: impl Into<String>) -> Self {
        ResolveError::DeclarationParse {
            origin: origin.into(),
            message: message.into(),
        }
    }

    /// Build a registry error.
    pub fn registry(
        registry: impl Into<String>,
        name: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        ResolveError::RegistryUnavailable {
            registry: registry.into(),
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that may be retried or degraded per entity.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::RegistryUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
