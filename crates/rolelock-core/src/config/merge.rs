//! Declaration layer merging logic
//!
//! Implements the 3-layer merge strategy:
//! Project manifest -> Scenario requirements -> Role metadata
//!
//! The first layer in that order wins. Within a layer the first occurrence of
//! a name wins.

use std::collections::BTreeMap;

use tracing::debug;

use super::loader::Declarations;
use super::requirement::{CollectionRequirement, RoleRequirement};
use crate::compat::PythonDeclaration;
use crate::version::Constraint;

/// One requirement per name, sorted by name within each class.
#[derive(Debug, Clone, Default)]
pub struct MergedRequirements {
    pub python: PythonDeclaration,
    pub tools: BTreeMap<String, Constraint>,
    pub collections: Vec<CollectionRequirement>,
    pub roles: Vec<RoleRequirement>,
}

/// Merge all declaration layers into a single requirement set.
///
/// Collections take the winning layer's record outright; a winner without a
/// version is unconstrained even if a lower layer pins one. Roles take the
/// winning layer's record and back-fill `source` and `constraint` from lower
/// layers when the winner leaves them unset. `scm` is only taken from the
/// layer that supplied `source`.
pub fn merge_declarations(declarations: Declarations) -> MergedRequirements {
    MergedRequirements {
        python: declarations.python,
        tools: declarations.tools,
        collections: merge_collections(declarations.collections),
        roles: merge_roles(declarations.roles),
    }
}

fn merge_collections(mut records: Vec<CollectionRequirement>) -> Vec<CollectionRequirement> {
    records.sort_by_key(|r| r.layer);

    let mut merged: BTreeMap<String, CollectionRequirement> = BTreeMap::new();
    for record in records {
        match merged.get(&record.name) {
            Some(winner) => debug!(
                collection = %record.name,
                winner = %winner.layer,
                shadowed = %record.layer,
                "Collection declaration shadowed"
            ),
            None => {
                merged.insert(record.name.clone(), record);
            }
        }
    }
    merged.into_values().collect()
}

fn merge_roles(mut records: Vec<RoleRequirement>) -> Vec<RoleRequirement> {
    records.sort_by_key(|r| r.layer);

    let mut merged: BTreeMap<String, RoleRequirement> = BTreeMap::new();
    for record in records {
        match merged.get_mut(&record.name) {
            Some(winner) => {
                debug!(
                    role = %record.name,
                    winner = %winner.layer,
                    shadowed = %record.layer,
                    "Role declaration shadowed"
                );
                // scm travels with the src it describes
                if winner.source.is_none() && record.source.is_some() {
                    winner.source = record.source;
                    if winner.scm.is_none() {
                        winner.scm = record.scm;
                    }
                }
                if winner.constraint.is_none() {
                    winner.constraint = record.constraint;
                }
            }
            None => {
                merged.insert(record.name.clone(), record);
            }
        }
    }
    merged.into_values().collect()
}
