use std::path::PathBuf;

use anyhow::{Context, Result};
use board::HostSystem;
use colored::Colorize;
use toolchain::{configure_default_packages, PackageManifest, PackageRequest};

#[derive(clap::Args)]
pub struct PackagesArgs {
    /// Platform manifest (`platform.json`)
    #[arg(long)]
    pub manifest: PathBuf,
    /// Board manifest
    #[arg(long)]
    pub board: Option<PathBuf>,
    /// Framework used by the project, repeatable
    #[arg(long = "framework")]
    pub frameworks: Vec<String>,
    /// `upload_protocol` project option
    #[arg(long)]
    pub upload_protocol: Option<String>,
    /// `debug_tool` project option
    #[arg(long)]
    pub debug_tool: Option<String>,
    /// Host system type (default: this host)
    #[arg(long)]
    pub systype: Option<String>,
    /// Print the pruned package table as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &PackagesArgs) -> Result<()> {
    let pruned = select(args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&pruned)?);
        return Ok(());
    }
    for name in pruned.names() {
        let Some(spec) = pruned.get(name) else {
            continue;
        };
        let status = if spec.optional {
            "optional".dimmed()
        } else {
            "required".green()
        };
        println!("{name:<40} {:<24} {status}", spec.version);
    }
    Ok(())
}

fn select(args: &PackagesArgs) -> Result<PackageManifest> {
    let text = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read {}", args.manifest.display()))?;
    let manifest = PackageManifest::from_platform_json(&args.manifest, &text)?;
    let board = args.board.as_deref().map(crate::load_board).transpose()?;
    let host = args
        .systype
        .clone()
        .map_or_else(HostSystem::current, HostSystem::from_systype);

    let request = PackageRequest {
        frameworks: args.frameworks.clone(),
        upload_protocol: args.upload_protocol.clone(),
        debug_tool: args.debug_tool.clone(),
    };
    tracing::debug!(%host, frameworks = ?request.frameworks, "selecting packages");
    Ok(configure_default_packages(&manifest, &request, board.as_ref(), &host))
}
