//! Running the size tool.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Token replaced by the path of the artifact being measured.
pub const SOURCES_PLACEHOLDER: &str = "$SOURCES";

/// A size tool command line, one token per argument.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SizeCommand {
    tokens: Vec<String>,
}

impl SizeCommand {
    /// A command from explicit tokens.
    #[must_use]
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Split a command string on whitespace.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        Self::new(template.split_whitespace().map(str::to_owned).collect())
    }

    /// `<tool> -A -d $SOURCES`, the section listing the report is built from.
    #[must_use]
    pub fn for_tool(tool: &str) -> Self {
        Self::new(vec![
            tool.to_owned(),
            "-A".to_owned(),
            "-d".to_owned(),
            SOURCES_PLACEHOLDER.to_owned(),
        ])
    }

    /// Replace the program (first token), keeping the arguments.
    #[must_use]
    pub fn with_program(mut self, program: &str) -> Self {
        match self.tokens.first_mut() {
            Some(first) => program.clone_into(first),
            None => self.tokens.push(program.to_owned()),
        }
        self
    }

    /// The raw tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Substitute `source` for `$SOURCES` and drop empty tokens.
    ///
    /// Returns `(program, args)`, or `None` if nothing is left to run.
    #[must_use]
    pub fn render(&self, source: &Path) -> Option<(String, Vec<String>)> {
        let source = source.to_string_lossy();
        let mut argv = self
            .tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.replace(SOURCES_PLACEHOLDER, &source));
        let program = argv.next()?;
        Some((program, argv.collect()))
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can run a program to completion.
pub trait CommandRunner {
    /// Run `program` with `args` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput>;
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    path: Option<OsString>,
}

impl SystemRunner {
    /// Inherit the current environment unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `path` as the child's `PATH`.
    #[must_use]
    pub fn with_path(path: impl Into<OsString>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Search `dirs` before the inherited `PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory contains the platform's path
    /// separator.
    pub fn with_path_prefix<I>(dirs: I) -> Result<Self, std::env::JoinPathsError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let joined =
            std::env::join_paths(dirs.into_iter().chain(std::env::split_paths(&inherited)))?;
        Ok(Self::with_path(joined))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> io::Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(path) = &self.path {
            cmd.env("PATH", path);
        }
        let output = cmd.output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run `command` against `source` and return its trimmed standard output.
///
/// `None` when the command is empty, cannot be spawned, or exits non-zero.
/// Failures are logged, never returned: a size report must not fail a build.
pub fn size_output<R: CommandRunner + ?Sized>(
    runner: &R,
    command: &SizeCommand,
    source: &Path,
) -> Option<String> {
    let (program, args) = command.render(source)?;
    tracing::debug!(%program, ?args, "running size tool");

    match runner.run(&program, &args) {
        Ok(out) if out.success() => Some(out.stdout.trim().to_owned()),
        Ok(out) => {
            tracing::warn!(
                %program,
                code = ?out.code,
                stderr = %out.stderr.trim(),
                "size tool failed"
            );
            None
        }
        Err(e) => {
            tracing::warn!(%program, error = %e, "size tool could not be started");
            None
        }
    }
}
