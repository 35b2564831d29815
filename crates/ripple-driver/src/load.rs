//! Reading programs and their source text from disk.

use std::fs;
use std::path::Path;

use eyre::{Result, WrapErr};
use ripple_ast::Program;
use tracing::debug;

/// Reads a program from its JSON encoding.
pub fn load_program(path: &Path) -> Result<Program> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read program {}", path.display()))?;
    let program: Program = serde_json::from_str(&text)
        .wrap_err_with(|| format!("{} is not a valid program", path.display()))?;
    debug!(
        path = %path.display(),
        imports = program.imports.len(),
        functions = program.functions.len(),
        "loaded program"
    );
    Ok(program)
}

/// Reads the source text that spans in a program point into.
pub fn load_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read source {}", path.display()))
}
