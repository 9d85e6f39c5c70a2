//! Version values, constraints and selection helpers.

pub mod constraint;
pub mod value;

pub use constraint::{
    Candidate, Constraint, NoMatch, Operator, Selection, VersionScheme, select, split_inline,
};
pub use value::{Version, compare_versions, is_branch_like};
