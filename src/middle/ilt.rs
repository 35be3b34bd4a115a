//! Intermediate Language Tree: the flattened simulation object.
//!
//! One [`FlatObject`] per `compile` target. All inherited and submodel
//! members live in one namespace keyed by dotted flat name; function
//! bodies reference attributes only through those flat names. The code
//! generator consumes this structure by enumerating `attrs` and
//! iterating each function's statements together with its usage
//! decorations.

use crate::frontend::parser::ast::{AttrRole, BlockKind, Stmt};
use crate::util::span::Span;
use indexmap::IndexMap;

/// One resolved leaf attribute of the flattened object
#[derive(Debug, Clone, PartialEq)]
pub struct FlatAttr {
    /// Dotted flat name, e.g. `system.V`
    pub name: String,
    pub role: AttrRole,
    /// Scalar type name; always a leaf type after flattening
    pub type_name: String,
    /// Class whose `data` statement declared the attribute
    pub origin_class: String,
    pub span: Span,
}

/// Per-statement read/write sets, attached by the usage checker.
///
/// Entries are index-aligned with a pre-order walk of the function
/// body, nested statements included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StmtUsage {
    pub reads: Vec<String>,
    pub writes: Vec<String>,
}

/// A fully inlined function body of the flattened object
#[derive(Debug, Clone, PartialEq)]
pub struct FlatFunction {
    pub name: String,
    pub kind: BlockKind,
    pub body: Vec<Stmt>,
    /// Filled in by the usage checker; empty until then
    pub usage: Vec<StmtUsage>,
}

/// The flattened compilation result for one top-level class
#[derive(Debug, Clone)]
pub struct FlatObject {
    pub name: String,
    /// Flat attribute namespace in declaration order
    pub attrs: IndexMap<String, FlatAttr>,
    /// The special blocks (`init`, `dynamic`, `final`) that exist,
    /// bodies fully inlined
    pub funcs: Vec<FlatFunction>,
}

impl FlatObject {
    pub fn function(&self, kind: BlockKind) -> Option<&FlatFunction> {
        self.funcs.iter().find(|f| f.kind == kind)
    }

    pub fn attr(&self, flat_name: &str) -> Option<&FlatAttr> {
        self.attrs.get(flat_name)
    }
}
