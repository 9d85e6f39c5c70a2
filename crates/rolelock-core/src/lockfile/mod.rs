//! Lock document generation, hashing and persistence.

pub mod freshness;
pub mod hash;
pub mod store;
pub mod types;

pub use freshness::check_freshness;
pub use hash::{HashRecord, content_hash};
pub use store::LockfileStore;
pub use types::{
    LOCK_FORMAT_VERSION, LockDocument, LockedCollection, LockedRole, LockedTool, plan_hash,
};
