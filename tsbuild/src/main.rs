// Host tool: errors are reported through anyhow.
#![allow(missing_docs)]

mod boards;
mod debug;
mod flags;
mod packages;
mod size;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tsbuild")]
#[command(about = "Teensy platform build configuration and size reports", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiler/linker configuration for a board
    Flags(flags::FlagsArgs),
    /// Prune a platform package manifest for a board and host
    Packages(packages::PackagesArgs),
    /// List the boards in a directory of manifests
    Boards {
        /// Directory containing `<board>.json` manifests
        #[arg(long)]
        dir: PathBuf,
        /// Print the manifests (with default debug tools) as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the debug server command line for a board
    Debug {
        /// Board manifest
        #[arg(long)]
        board: PathBuf,
        /// Debug tool name
        #[arg(long, default_value = "jlink")]
        tool: String,
        /// Adapter speed (kHz)
        #[arg(long)]
        speed: Option<String>,
    },
    /// Print RAM/flash usage of a linked firmware image
    Size(size::SizeArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Flags(args) => flags::run(&args),
        Commands::Packages(args) => packages::run(&args),
        Commands::Boards { dir, json } => boards::run(&dir, json),
        Commands::Debug { board, tool, speed } => debug::run(&board, &tool, speed),
        Commands::Size(args) => size::run(&args),
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load a board manifest named after its file.
fn load_board(path: &Path) -> Result<board::BoardConfig> {
    board::BoardConfig::load(path)
        .with_context(|| format!("Failed to load board manifest {}", path.display()))
}
