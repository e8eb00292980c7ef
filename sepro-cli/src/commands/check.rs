//! Check command: compile a model and report what it declares.

use super::load_model;
use anyhow::Result;
use std::path::Path;

pub fn check_model(model_path: &Path, json: bool) -> Result<()> {
    let model = load_model(model_path)?;

    let mut worlds: Vec<&str> = model
        .worlds
        .keys()
        .filter_map(|&name| model.symbols.name(name))
        .collect();
    worlds.sort_unstable();

    if json {
        let payload = serde_json::json!({
            "concepts": model.concepts.len(),
            "actuators": model.actuators.len(),
            "measures": model.measures.len(),
            "worlds": worlds,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} concepts, {} actuators, {} measures",
            model.concepts.len(),
            model.actuators.len(),
            model.measures.len()
        );
        println!("worlds: {}", worlds.join(", "));
    }

    Ok(())
}
