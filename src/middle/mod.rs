//! Middle end: resolution, flattening, and usage checking.

pub mod flatten;
pub mod ilt;
pub mod symbols;
pub mod types;
pub mod usage;

use crate::frontend::error::CompileError;
use crate::frontend::parser::ast::Module;
pub use ilt::{FlatAttr, FlatFunction, FlatObject, StmtUsage};
pub use symbols::ClassTable;

/// Run the middle-end passes over a parsed module: build and resolve
/// the class table, flatten each `compile` target, and usage-check the
/// results. Resolution and flattening errors are fatal; usage errors
/// are accumulated across all compiled objects.
pub fn compile_module(module: &Module) -> Result<Vec<FlatObject>, CompileError> {
    let table = ClassTable::build(module)?;
    if module.compile_targets.is_empty() {
        tracing::warn!(module = %module.name, "module contains no compiled process");
    }
    let mut objects = Vec::new();
    let mut usage_errors = Vec::new();
    for (name, span) in &module.compile_targets {
        let mut object = flatten::flatten(&table, name, *span)?;
        usage_errors.extend(usage::check(&mut object));
        objects.push(object);
    }
    if !usage_errors.is_empty() {
        return Err(CompileError::Usage(usage_errors));
    }
    Ok(objects)
}
