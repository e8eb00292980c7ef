//! Run command implementation.

use super::load_model;
use anyhow::{Context, Result};
use sepro_engine::{ConsoleLogger, Engine};
use std::io;
use std::path::Path;

pub fn run_model(
    model_path: &Path,
    steps: u64,
    world: &str,
    seed: Option<u64>,
    dump: bool,
) -> Result<()> {
    let model = load_model(model_path)?;
    tracing::info!(
        concepts = model.concepts.len(),
        actuators = model.actuators.len(),
        "model loaded"
    );

    let logger = ConsoleLogger::new(model.symbols.clone());
    let mut engine = match seed {
        Some(seed) => Engine::with_seed(model, seed),
        None => Engine::new(model),
    };
    engine.set_logger(Box::new(logger));

    engine
        .initialize(world)
        .with_context(|| format!("Failed to initialize world '{}'", world))?;
    engine.run(steps);

    println!(
        "ran {} steps, {} objects{}",
        engine.step_count(),
        engine.container().len(),
        if engine.is_halted() { ", halted" } else { "" }
    );
    if dump {
        engine
            .debug_dump(&mut io::stdout())
            .context("Failed to write dump")?;
    }

    Ok(())
}
