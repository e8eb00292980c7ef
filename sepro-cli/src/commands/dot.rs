//! DOT export: run a model and render the final object graph for GraphViz.

use super::load_model;
use anyhow::{Context, Result};
use sepro_engine::Engine;
use std::io::Write;
use std::path::Path;

pub fn render_dot(
    model_path: &Path,
    steps: u64,
    world: &str,
    seed: Option<u64>,
    output: Option<&Path>,
) -> Result<()> {
    let model = load_model(model_path)?;
    let mut engine = match seed {
        Some(seed) => Engine::with_seed(model, seed),
        None => Engine::new(model),
    };
    engine
        .initialize(world)
        .with_context(|| format!("Failed to initialize world '{}'", world))?;
    engine.run(steps);

    let mut rendered = Vec::new();
    write_dot(&engine, &mut rendered).context("Failed to render graph")?;

    match output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("Failed to write {:?}", path))?,
        None => std::io::stdout().write_all(&rendered)?,
    }
    Ok(())
}

/// Render the engine's object graph: one node per object labeled with its
/// tags and non-zero counters, one edge per bound slot labeled with the
/// slot name. Output ordering follows object ids and is deterministic.
fn write_dot(engine: &Engine, out: &mut impl Write) -> std::io::Result<()> {
    let symbols = &engine.model().symbols;

    writeln!(out, "digraph sepro {{")?;
    writeln!(out, "    node [shape=box];")?;

    for object in engine.container().iter() {
        let mut label_parts: Vec<String> =
            object.tags.iter().map(|tag| symbols.display(tag)).collect();
        label_parts.extend(
            object
                .counters
                .iter()
                .filter(|&(_, value)| value != 0)
                .map(|(counter, value)| format!("{}={}", symbols.display(counter), value)),
        );
        writeln!(
            out,
            "    n{} [label=\"{} {}\"];",
            object.id().as_u64(),
            object.id(),
            label_parts.join(" ")
        )?;
    }

    for object in engine.container().iter() {
        for (slot, target) in object.bindings() {
            if let Some(target) = target {
                writeln!(
                    out,
                    "    n{} -> n{} [label=\"{}\"];",
                    object.id().as_u64(),
                    target.as_u64(),
                    symbols.display(slot)
                )?;
            }
        }
    }

    writeln!(out, "}}")
}
