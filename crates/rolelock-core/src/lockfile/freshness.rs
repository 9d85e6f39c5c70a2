//! Lock freshness checking without network access.

use tracing::debug;

use super::types::{LockDocument, plan_hash};
use crate::error::ResolveError;
use crate::resolve::ResolutionPlan;

/// Compare a persisted lock against the current declarations.
///
/// Fresh when the stored content hash equals the hash of the current plan;
/// otherwise [`ResolveError::StaleLock`] with both hashes.
pub fn check_freshness(plan: &ResolutionPlan, lock: &LockDocument) -> Result<(), ResolveError> {
    let current = plan_hash(plan);
    if current == lock.content_hash {
        debug!(hash = %current, "Lock is fresh");
        return Ok(());
    }
    Err(ResolveError::StaleLock {
        persisted: lock.content_hash.clone(),
        current,
    })
}
