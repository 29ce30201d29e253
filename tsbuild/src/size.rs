use std::path::PathBuf;

use anyhow::{Context, Result};
use board::BoardConfig;
use size_report::{
    CommandRunner, MemoryLimits, ReportMode, SizeConfig, SizeReporter, SystemRunner,
};
use toolchain::SizeReportMode;

#[derive(clap::Args)]
pub struct SizeArgs {
    /// Board manifest
    #[arg(long)]
    pub board: PathBuf,
    /// Linked firmware image
    pub elf: PathBuf,
    /// Size tool executable (default: `avr-size` for the AVR core, else the
    /// size configuration's tool)
    #[arg(long)]
    pub size_tool: Option<String>,
    /// Size configuration JSON (default: built-in Teensy 4 profile)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Toolchain directory searched before `PATH` (and its `bin/`)
    #[arg(long)]
    pub toolchain_dir: Option<PathBuf>,
    /// Also print the ITCM padding and the raw size tool output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration problems are errors; the size tool itself failing is not.
pub fn run(args: &SizeArgs) -> Result<()> {
    let board = crate::load_board(&args.board)?;
    let runner = match &args.toolchain_dir {
        Some(dir) => SystemRunner::with_path_prefix([dir.join("bin"), dir.clone()])
            .with_context(|| format!("Invalid toolchain directory {}", dir.display()))?,
        None => SystemRunner::new(),
    };
    for line in report(args, &board, runner)? {
        println!("{line}");
    }
    Ok(())
}

fn report<R: CommandRunner>(args: &SizeArgs, board: &BoardConfig, runner: R) -> Result<Vec<String>> {
    let config = match &args.config {
        Some(path) => SizeConfig::load(path)
            .with_context(|| format!("Failed to load size configuration {}", path.display()))?,
        None => SizeConfig::teensy4()?,
    };
    let patterns = config
        .compile()
        .context("Size configuration has an invalid section pattern")?;
    let command = match (&args.size_tool, &args.config) {
        (Some(tool), _) => config.command.with_program(tool),
        (None, Some(_)) => config.command,
        (None, None) => config.command.with_program(default_size_tool(board)),
    };

    let reporter = SizeReporter::new(runner, command, patterns)
        .mode(report_mode(board))
        .limits(MemoryLimits {
            flash: board.upload.maximum_size,
            ram: board.upload.maximum_ram_size,
        })
        .verbose(args.verbose || pio_verbose());

    Ok(reporter.report(&args.elf))
}

/// The built-in profile's tool, per target architecture.
fn default_size_tool(board: &BoardConfig) -> &'static str {
    match board.core() {
        Some("teensy") => "avr-size",
        _ => "arm-none-eabi-size",
    }
}

fn report_mode(board: &BoardConfig) -> ReportMode {
    match SizeReportMode::for_board(board) {
        SizeReportMode::ItcmAware => ReportMode::Itcm,
        SizeReportMode::Standard => ReportMode::Standard,
    }
}

/// `PIOVERBOSE` set to a non-zero integer.
fn pio_verbose() -> bool {
    parse_verbose(std::env::var("PIOVERBOSE").ok().as_deref())
}

fn parse_verbose(value: Option<&str>) -> bool {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .is_some_and(|v| v != 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use size_report::CommandOutput;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct Canned(Option<&'static str>);

    impl CommandRunner for Canned {
        fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
            assert_eq!(program, "/opt/arm/bin/arm-none-eabi-size");
            assert_eq!(args.last().map(String::as_str), Some("firmware.elf"));
            self.0
                .map(|stdout| CommandOutput {
                    code: Some(0),
                    stdout: stdout.to_owned(),
                    stderr: String::new(),
                })
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
        }
    }

    const OUTPUT: &str = "\
firmware.elf  :
section             size         addr
.text.progmem      10000   1610612736
.text.itcm         32769            0
.data               1000    536870912
.bss.dma            4096    538968064
";

    fn args(tmp: &TempDir, core: &str) -> (SizeArgs, BoardConfig) {
        let board_path = tmp.path().join("teensy41.json");
        fs::write(
            &board_path,
            format!(
                r#"{{"build": {{"core": "{core}"}}, "upload": {{"maximum_size": 8126464, "maximum_ram_size": 524288}}}}"#
            ),
        )
        .unwrap();
        let board = crate::load_board(&board_path).unwrap();
        let args = SizeArgs {
            board: board_path,
            elf: PathBuf::from("firmware.elf"),
            size_tool: Some("/opt/arm/bin/arm-none-eabi-size".to_owned()),
            config: None,
            toolchain_dir: None,
            verbose: false,
        };
        (args, board)
    }

    #[test]
    fn teensy4_board_gets_itcm_report() {
        let tmp = TempDir::new().unwrap();
        let (args, board) = args(&tmp, "teensy4");
        let lines = report(&args, &board, Canned(Some(OUTPUT))).unwrap();
        assert_eq!(lines.len(), 3);
        // .data + .text.itcm + 32767 bytes of ITCM padding
        assert!(lines[0].starts_with("RAM 1:  "));
        assert!(lines[0].contains("(used 66536 bytes from 524288 bytes)"));
        assert!(lines[1].contains("(used 4096 bytes"));
        assert!(lines[2].starts_with("Flash:  "));
    }

    #[test]
    fn other_cores_get_standard_report() {
        let tmp = TempDir::new().unwrap();
        let (args, board) = args(&tmp, "teensy3");
        let lines = report(&args, &board, Canned(Some(OUTPUT))).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("RAM:   "));
        assert!(lines[0].contains("(used 33769 bytes"));
    }

    /// Records the programs it is asked to run, which all fail to start.
    struct Recording(Rc<RefCell<Vec<String>>>);

    impl CommandRunner for Recording {
        fn run(&self, program: &str, _args: &[String]) -> std::io::Result<CommandOutput> {
            self.0.borrow_mut().push(program.to_owned());
            Err(std::io::Error::from(std::io::ErrorKind::NotFound))
        }
    }

    #[test]
    fn default_size_tool_follows_the_core() {
        let tmp = TempDir::new().unwrap();
        for (core, tool) in [
            ("teensy", "avr-size"),
            ("teensy3", "arm-none-eabi-size"),
            ("teensy4", "arm-none-eabi-size"),
        ] {
            let (mut args, board) = args(&tmp, core);
            args.size_tool = None;
            let programs: Rc<RefCell<Vec<String>>> = Rc::default();
            let runner = Recording(Rc::clone(&programs));
            assert!(report(&args, &board, runner).unwrap().is_empty());
            assert_eq!(*programs.borrow(), [tool]);
        }
    }

    #[test]
    fn missing_tool_prints_nothing_and_succeeds() {
        let tmp = TempDir::new().unwrap();
        let (args, board) = args(&tmp, "teensy4");
        assert!(report(&args, &board, Canned(None)).unwrap().is_empty());
    }

    #[test]
    fn bad_config_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let (mut args, board) = args(&tmp, "teensy4");
        let config = tmp.path().join("size.json");
        fs::write(&config, r#"{"command": ["size"], "patterns": {"data": "(["}}"#).unwrap();
        args.config = Some(config);
        assert!(report(&args, &board, Canned(None)).is_err());
    }

    #[test]
    fn pioverbose_must_be_non_zero() {
        assert!(!parse_verbose(None));
        assert!(!parse_verbose(Some("0")));
        assert!(!parse_verbose(Some("")));
        assert!(!parse_verbose(Some("yes")));
        assert!(parse_verbose(Some("1")));
        assert!(parse_verbose(Some(" 2 ")));
    }
}
