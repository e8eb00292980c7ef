//! CLI command implementations.

mod check;
mod dot;
mod run;

pub use check::check_model;
pub use dot::render_dot;
pub use run::run_model;

use anyhow::{Context, Result};
use sepro_lang::Model;
use std::path::Path;

/// Load and compile a model source file.
pub fn load_model(path: &Path) -> Result<Model> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file {:?}", path))?;
    let model = sepro_lang::compile_source(&source)
        .with_context(|| format!("Failed to compile model {:?}", path))?;
    Ok(model)
}
