use std::path::Path;

use anyhow::{Context, Result};
use board::HostSystem;
use toolchain::{add_default_debug_tools, configure_debug_options, DebugOptions};

pub fn run(board: &Path, tool: &str, speed: Option<String>) -> Result<()> {
    let options = resolve(board, tool, speed, &HostSystem::current())?;
    let server = options
        .server
        .with_context(|| format!("Debug tool `{tool}` has no GDB server"))?;
    println!("{} {}", server.executable, server.arguments.join(" "));
    Ok(())
}

fn resolve(
    board: &Path,
    tool: &str,
    speed: Option<String>,
    host: &HostSystem,
) -> Result<DebugOptions> {
    let board = add_default_debug_tools(crate::load_board(board)?, host)?;
    let entry = board
        .debug
        .tools
        .get(tool)
        .with_context(|| format!("Board `{}` has no debug tool `{tool}`", board.id))?;

    Ok(configure_debug_options(&DebugOptions {
        speed,
        server: entry.server.clone(),
    }))
}
