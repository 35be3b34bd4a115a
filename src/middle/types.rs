//! Built-in scalar types and mathematical functions.
//!
//! This is the small collaborator surface the resolver and flattener
//! consult to decide whether a name is a known leaf type or a callable
//! math function. A richer units subsystem would slot in here.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// The built-in scalar type every flat attribute bottoms out in
pub const REAL: &str = "Real";

pub fn is_built_in_scalar(name: &str) -> bool {
    name == REAL
}

/// Functions usable in expressions, resolved by the numerical runtime
static MATH_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "sqrt", "exp", "log", "log10", "sin", "cos", "tan", "asin", "acos", "atan", "abs", "min",
        "max",
    ]
    .into_iter()
    .collect()
});

pub fn is_math_function(name: &str) -> bool {
    MATH_FUNCTIONS.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_and_function_tables() {
        assert!(is_built_in_scalar("Real"));
        assert!(!is_built_in_scalar("real"));
        assert!(is_math_function("sqrt"));
        assert!(!is_math_function("system"));
    }
}
