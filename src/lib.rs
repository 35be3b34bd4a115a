//! simlc — compiler front and middle end for the Siml modeling
//! language.
//!
//! Siml describes differential-algebraic equation models as classes
//! with typed data declarations and equation blocks. The pipeline
//! tokenizes and parses source text, resolves the class hierarchy,
//! flattens each compiled class into one simulation object, and
//! usage-checks the result. The flattened objects are what a code
//! generator for a numerical runtime consumes.
//!
//! ```
//! let source = "\
//! class Decay:
//!     data x: Real
//!     data k: Real param
//!
//!     func init():
//!         k := 0.5
//!         x := 1
//!
//!     func dynamic():
//!         $x := 0 - k * x
//!
//! compile Decay
//! ";
//! let objects = simlc::compile_str(source, "decay").unwrap();
//! assert_eq!(objects[0].name, "Decay");
//! assert!(objects[0].attrs.contains_key("x"));
//! ```

pub mod frontend;
pub mod middle;
pub mod util;

use anyhow::Context;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

pub use frontend::error::{CompileError, Diagnostic, ErrorCode};
pub use middle::{FlatAttr, FlatFunction, FlatObject, StmtUsage};

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile Siml source text into flattened simulation objects, one per
/// `compile` directive.
pub fn compile_str(source: &str, module_name: &str) -> Result<Vec<FlatObject>, CompileError> {
    tracing::debug!(module = module_name, bytes = source.len(), "compiling");
    let module = frontend::parse_source(source, module_name)?;
    middle::compile_module(&module)
}

/// Compile a Siml source file. The `.siml` extension is a convention,
/// not a requirement; other extensions only draw a warning.
pub fn compile_file(path: &Path) -> anyhow::Result<Vec<FlatObject>> {
    if path.extension() != Some(OsStr::new("siml")) {
        tracing::warn!(
            path = %path.display(),
            "source file does not use the .siml extension"
        );
    }
    let source = fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let module_name = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("module");
    Ok(compile_str(&source, module_name)?)
}
