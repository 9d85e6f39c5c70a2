//! Interpreter pinning and interpreter/tool compatibility.

pub mod interpreter;
pub mod table;

pub use interpreter::{
    InterpreterSpec, PYTHON_RELEASES, PythonDeclaration, canonical_patch, is_allowed_release,
    resolve_interpreter,
};
pub use table::{Adjustment, COMPATIBILITY_TABLE, ToolBounds, adjust_tools, bounds_for_minor};
