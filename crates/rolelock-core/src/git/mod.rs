//! Git role sources.
//!
//! - Parsing role `src` locators
//! - Listing remote tags for tag-based version resolution

mod spec;
mod tags;

pub use spec::{RoleSource, SourceKind};
pub use tags::GitTagLister;

#[cfg(test)]
mod tests;
