//! Class table and name resolution.
//!
//! Classes stay owned by the [`Module`]; the table holds name-keyed
//! references and validates the inheritance graph and every declared
//! member type before flattening runs. Cycle detection walks base links
//! iteratively with an explicit visited set, so pathological chains fail
//! with a proper diagnostic instead of exhausting the stack.

use crate::frontend::error::{Diagnostic, ErrorCode};
use crate::frontend::parser::ast::{ClassDef, Module};
use crate::middle::types;
use indexmap::IndexMap;
use std::collections::HashSet;

pub struct ClassTable<'m> {
    classes: IndexMap<&'m str, &'m ClassDef>,
}

impl<'m> ClassTable<'m> {
    /// Build and fully resolve the table. Fatal on duplicate class
    /// names, unknown base classes, inheritance cycles, and unknown
    /// member types.
    pub fn build(module: &'m Module) -> Result<Self, Diagnostic> {
        let mut classes: IndexMap<&str, &ClassDef> = IndexMap::new();
        for class in &module.classes {
            if let Some(first) = classes.get(class.name.as_str()) {
                return Err(Diagnostic::new(
                    ErrorCode::Redefinition,
                    format!(
                        "redefinition of class '{}'; first defined at {}",
                        class.name, first.span.start
                    ),
                    class.span,
                ));
            }
            classes.insert(class.name.as_str(), class);
        }
        let table = Self { classes };
        table.resolve()?;
        tracing::debug!(classes = table.classes.len(), "class table resolved");
        Ok(table)
    }

    fn resolve(&self) -> Result<(), Diagnostic> {
        for class in self.classes.values() {
            if let Some((base, base_span)) = &class.base {
                if !self.classes.contains_key(base.as_str()) {
                    return Err(Diagnostic::new(
                        ErrorCode::UnknownBaseClass,
                        format!("unknown base class '{}' of class '{}'", base, class.name),
                        *base_span,
                    ));
                }
            }
            self.check_no_cycle(class)?;
            for decl in &class.data {
                let known = types::is_built_in_scalar(&decl.type_name)
                    || self.classes.contains_key(decl.type_name.as_str());
                if !known {
                    return Err(Diagnostic::new(
                        ErrorCode::UnknownType,
                        format!(
                            "unknown type '{}' in class '{}'",
                            decl.type_name, class.name
                        ),
                        decl.type_span,
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_no_cycle(&self, start: &ClassDef) -> Result<(), Diagnostic> {
        let mut visited = HashSet::new();
        let mut current = start;
        visited.insert(current.name.as_str());
        while let Some((base, base_span)) = &current.base {
            let Some(&next) = self.classes.get(base.as_str()) else {
                // reported as UnknownBaseClass by resolve()
                return Ok(());
            };
            if !visited.insert(next.name.as_str()) {
                return Err(Diagnostic::new(
                    ErrorCode::CyclicInheritance,
                    format!(
                        "cyclic inheritance involving class '{}' (via '{}')",
                        start.name, next.name
                    ),
                    *base_span,
                ));
            }
            current = next;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&'m ClassDef> {
        self.classes.get(name).copied()
    }

    /// Inheritance chain of `name`, base-first, most-derived last.
    /// The table must be resolved; unknown names yield an empty chain.
    pub fn inheritance_chain(&self, name: &str) -> Vec<&'m ClassDef> {
        let mut chain = Vec::new();
        let mut current = self.get(name);
        while let Some(class) = current {
            chain.push(class);
            current = class.base.as_ref().and_then(|(base, _)| self.get(base));
        }
        chain.reverse();
        chain
    }

    /// Leaf types are never expanded by the flattener: the built-in
    /// scalars plus classes carrying `no_flatten` or `built_in_type`.
    pub fn is_leaf_type(&self, type_name: &str) -> bool {
        if types::is_built_in_scalar(type_name) {
            return true;
        }
        match self.get(type_name) {
            Some(class) => class.pragmas.no_flatten || class.pragmas.built_in_type,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parse_source;

    fn table_err(source: &str) -> Diagnostic {
        let module = parse_source(source, "test").expect("parse failed");
        ClassTable::build(&module)
            .err()
            .expect("resolution should have failed")
    }

    #[test]
    fn test_resolves_chain_base_first() {
        let module = parse_source(
            "class A:\n    data x: Real\nclass B(A):\n    data y: Real\nclass C(B): pass\n",
            "test",
        )
        .unwrap();
        let table = ClassTable::build(&module).unwrap();
        let chain: Vec<&str> = table
            .inheritance_chain("C")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(chain, ["A", "B", "C"]);
    }

    #[test]
    fn test_duplicate_class_is_redefinition() {
        let err = table_err("class A: pass\nclass A: pass\n");
        assert_eq!(err.code, ErrorCode::Redefinition);
        assert!(err.message.contains("'A'"));
    }

    #[test]
    fn test_unknown_base_class() {
        let err = table_err("class B(Missing): pass\n");
        assert_eq!(err.code, ErrorCode::UnknownBaseClass);
    }

    #[test]
    fn test_cyclic_inheritance_detected() {
        let err = table_err("class A(B): pass\nclass B(A): pass\n");
        assert_eq!(err.code, ErrorCode::CyclicInheritance);
    }

    #[test]
    fn test_unknown_member_type() {
        let err = table_err("class A:\n    data x: Imaginary\n");
        assert_eq!(err.code, ErrorCode::UnknownType);
        assert!(err.message.contains("Imaginary"));
    }

    #[test]
    fn test_leaf_types() {
        let module = parse_source(
            "class Opaque: pragma no_flatten\nclass Sub:\n    data x: Real\n",
            "test",
        )
        .unwrap();
        let table = ClassTable::build(&module).unwrap();
        assert!(table.is_leaf_type("Real"));
        assert!(table.is_leaf_type("Opaque"));
        assert!(!table.is_leaf_type("Sub"));
    }
}
