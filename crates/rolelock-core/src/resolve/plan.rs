//! Resolution plan: merged declarations plus interpreter pin and
//! compatibility-adjusted tool constraints. Building a plan needs no network.

use std::collections::BTreeMap;

use crate::compat::{InterpreterSpec, adjust_tools, resolve_interpreter};
use crate::config::{
    CollectionRequirement, Declarations, RoleRequirement, TOOL_NAMES, ToolRequirement,
    merge_declarations,
};
use crate::error::ResolveError;
use crate::version::Constraint;

/// Everything the resolver and the content hash need.
#[derive(Debug, Clone)]
pub struct ResolutionPlan {
    pub interpreter: InterpreterSpec,
    /// Every tool in lock order, with its effective constraint.
    pub tools: Vec<ToolRequirement>,
    pub collections: Vec<CollectionRequirement>,
    pub roles: Vec<RoleRequirement>,
    /// Interpreter and compatibility warnings.
    pub warnings: Vec<String>,
}

impl ResolutionPlan {
    /// Merge layers, pin the interpreter and adjust tool constraints.
    pub fn build(declarations: Declarations) -> Result<Self, ResolveError> {
        let merged = merge_declarations(declarations);
        let mut warnings = Vec::new();
        let interpreter = resolve_interpreter(&merged.python, &mut warnings)?;

        let requested: BTreeMap<String, Constraint> = TOOL_NAMES
            .iter()
            .map(|name| {
                let constraint = merged.tools.get(*name).cloned().unwrap_or(Constraint::Any);
                (name.to_string(), constraint)
            })
            .collect();
        let mut adjustment = adjust_tools(&interpreter.pinned_minor(), &requested);
        warnings.append(&mut adjustment.warnings);

        let tools = TOOL_NAMES
            .iter()
            .map(|name| ToolRequirement {
                name: name.to_string(),
                constraint: adjustment
                    .constraints
                    .remove(*name)
                    .unwrap_or(Constraint::Any),
            })
            .collect();

        Ok(Self {
            interpreter,
            tools,
            collections: merged.collections,
            roles: merged.roles,
            warnings,
        })
    }
}
