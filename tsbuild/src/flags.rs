use std::path::PathBuf;

use anyhow::{Context, Result};
use board::HostSystem;
use colored::Colorize;
use toolchain::flags::FRAMEWORK_PACKAGE;
use toolchain::{
    configure_framework, patch_core_includes, BuildContext, Define, FlagSet, FrameworkConfig,
    PackageDirectory, StaticContext,
};

#[derive(clap::Args)]
pub struct FlagsArgs {
    /// Board manifest
    #[arg(long)]
    pub board: PathBuf,
    /// Preprocessor define (`NAME` or `NAME=VALUE`), repeatable
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    pub defines: Vec<Define>,
    /// Directory holding the installed packages
    #[arg(long)]
    pub packages_dir: PathBuf,
    /// Host system type (default: this host)
    #[arg(long)]
    pub systype: Option<String>,
    /// Parallel LTO jobs (default: available CPUs)
    #[arg(long)]
    pub jobs: Option<usize>,
    /// Rewrite relative includes of the AVR core in place
    #[arg(long)]
    pub patch_core: bool,
    /// Print the configuration as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &FlagsArgs) -> Result<()> {
    let ctx = StaticContext {
        board: crate::load_board(&args.board)?,
        host: args
            .systype
            .clone()
            .map_or_else(HostSystem::current, HostSystem::from_systype),
        defines: args.defines.clone(),
        packages: PackageDirectory::new(&args.packages_dir),
    };
    let jobs = args.jobs.unwrap_or_else(default_jobs);

    let config = configure_framework(&ctx, jobs, unix_now())
        .with_context(|| format!("Failed to configure board `{}`", ctx.board.id))?;

    if args.patch_core {
        patch_avr_core(&ctx)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", format!("{} ({})", ctx.board.name, ctx.board.id).cyan().bold());
        for line in render(&config) {
            println!("{line}");
        }
    }
    Ok(())
}

fn patch_avr_core(ctx: &StaticContext) -> Result<()> {
    let core = ctx.board.core();
    if core != Some("teensy") {
        tracing::debug!(?core, "core include patching only applies to the AVR core");
        return Ok(());
    }
    let core_dir = ctx
        .package_dir(FRAMEWORK_PACKAGE)
        .with_context(|| format!("Package {FRAMEWORK_PACKAGE} is not installed"))?
        .join("teensy");
    let patched = patch_core_includes(&core_dir)
        .with_context(|| format!("Failed to patch {}", core_dir.display()))?;
    eprintln!(
        "{}",
        format!("  ✓ Rewrote includes in {patched} core file(s)").green()
    );
    Ok(())
}

/// One `NAME: value…` line per non-empty setting.
pub fn render(config: &FrameworkConfig) -> Vec<String> {
    let FlagSet {
        asflags,
        asppflags,
        cflags,
        ccflags,
        cxxflags,
        cppdefines,
        linkflags,
        libs,
        ranlibflags,
        cpppath,
        libpath,
        libsource_dirs,
    } = &config.flags;

    let paths = |p: &[PathBuf]| p.iter().map(|p| p.display().to_string()).collect::<Vec<_>>();
    let defines: Vec<String> = cppdefines.iter().map(ToString::to_string).collect();

    let mut lines = Vec::new();
    let mut push = |name: &str, values: &[String]| {
        if !values.is_empty() {
            lines.push(format!("{name}: {}", values.join(" ")));
        }
    };
    push("ASFLAGS", asflags);
    push("ASPPFLAGS", asppflags);
    push("CFLAGS", cflags);
    push("CCFLAGS", ccflags);
    push("CXXFLAGS", cxxflags);
    push("CPPDEFINES", &defines);
    push("LINKFLAGS", linkflags);
    push("LIBS", libs);
    push("RANLIBFLAGS", ranlibflags);
    push("CPPPATH", &paths(cpppath));
    push("LIBPATH", &paths(libpath));
    push("LIBSOURCE_DIRS", &paths(libsource_dirs));
    if let Some(ldscript) = &config.ldscript_path {
        push("LDSCRIPT_PATH", &[ldscript.clone()]);
    }
    if let Some(profile) = config.optimization {
        push("OPTIMIZATION", &[profile.define().to_owned()]);
    }
    let libraries: Vec<String> = config
        .libraries
        .iter()
        .map(|l| format!("{}={}", l.name, l.dir.display()))
        .collect();
    push("LIBRARIES", &libraries);
    lines
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(core: &str) -> (TempDir, FlagsArgs) {
        let tmp = TempDir::new().unwrap();
        let packages = tmp.path().join("packages");
        let framework = packages.join(FRAMEWORK_PACKAGE);
        fs::create_dir_all(framework.join("teensy")).unwrap();
        fs::write(framework.join("package.json"), r#"{"version": "1.159.0"}"#).unwrap();
        fs::create_dir_all(packages.join("framework-arduinoteensy")).unwrap();

        let board = tmp.path().join("teensy.json");
        fs::write(
            &board,
            format!(
                r#"{{"name": "Teensy", "build": {{"core": "{core}", "mcu": "at90usb1286", "cpu": "cortex-m7", "f_cpu": "16000000L"}}}}"#
            ),
        )
        .unwrap();

        let args = FlagsArgs {
            board,
            defines: vec!["USB_MIDI".parse().unwrap()],
            packages_dir: packages,
            systype: Some("linux_x86_64".to_owned()),
            jobs: Some(4),
            patch_core: true,
            json: false,
        };
        (tmp, args)
    }

    #[test]
    fn run_patches_the_avr_core() {
        let (tmp, args) = fixture("teensy");
        let source = tmp
            .path()
            .join("packages")
            .join(FRAMEWORK_PACKAGE)
            .join("teensy")
            .join("usb.c");
        fs::write(&source, "#include \"../usb_common.h\"\n").unwrap();

        run(&args).unwrap();
        assert_eq!(fs::read_to_string(&source).unwrap(), "#include \"usb_common.h\"\n");
    }

    #[test]
    fn run_fails_without_framework() {
        let (tmp, mut args) = fixture("teensy4");
        args.packages_dir = tmp.path().join("nowhere");
        assert!(run(&args).is_err());
    }

    #[test]
    fn render_lists_non_empty_settings() {
        let (_tmp, args) = fixture("teensy");
        let ctx = StaticContext {
            board: crate::load_board(&args.board).unwrap(),
            host: HostSystem::from_systype("linux_x86_64"),
            defines: args.defines.clone(),
            packages: PackageDirectory::new(&args.packages_dir),
        };
        let config = configure_framework(&ctx, 4, 0).unwrap();
        let lines = render(&config);

        let defines = lines.iter().find(|l| l.starts_with("CPPDEFINES: ")).unwrap();
        assert!(defines.contains("USB_MIDI"));
        assert!(defines.contains("TEENSYDUINO=159"));
        assert!(!defines.contains("USB_SERIAL"));
        assert!(lines.iter().any(|l| l.starts_with("LIBS: m")));
        assert!(lines.iter().all(|l| !l.starts_with("RANLIBFLAGS")));
    }
}
