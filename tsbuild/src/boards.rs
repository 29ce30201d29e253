use std::path::Path;

use anyhow::{Context, Result};
use board::{BoardRegistry, HostSystem};
use colored::Colorize;
use toolchain::add_default_debug_tools;

pub fn run(dir: &Path, json: bool) -> Result<()> {
    let registry = load(dir, &HostSystem::current())?;

    if json {
        let boards: serde_json::Map<String, serde_json::Value> = registry
            .iter()
            .map(|b| serde_json::to_value(b).map(|v| (b.id.clone(), v)))
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string_pretty(&boards)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("{} board(s) in {}", registry.len(), dir.display())
            .cyan()
            .bold()
    );
    for board in registry.iter() {
        let tools: Vec<&str> = board.debug.tools.keys().map(String::as_str).collect();
        println!(
            "  {:<12} {:<28} {}",
            board.id.bold(),
            board.name,
            tools.join(", ").dimmed()
        );
    }
    Ok(())
}

/// Load every manifest under `dir` and fill in default debug tools.
pub fn load(dir: &Path, host: &HostSystem) -> Result<BoardRegistry> {
    let mut registry = BoardRegistry::load_dir(dir)
        .with_context(|| format!("Failed to load boards from {}", dir.display()))?;
    for board in registry.iter_mut() {
        let configured = add_default_debug_tools(std::mem::take(board), host)?;
        *board = configured;
    }
    Ok(registry)
}
