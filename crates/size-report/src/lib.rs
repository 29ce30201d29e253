//! Firmware size reporting.
//!
//! A size tool (`arm-none-eabi-size -A -d`) prints one line per ELF section.
//! Section patterns (configuration, not code) decide which sections count
//! toward which memory region; the totals are rendered as usage bars.
//!
//! ```text
//! size tool ──stdout──▶ extract (×4 patterns) ──▶ ITCM padding ──▶ format ──▶ lines
//! ```
//!
//! A size report is advisory: a missing tool, a failing tool or a pattern
//! that does not apply leaves a region "unavailable" and its line is simply
//! not printed. Nothing here aborts the enclosing build.
//!
//! # Modules
//!
//! - [`extract`]: `SectionPattern`, `calculate_size`
//! - [`format`]: `format_usage`, the `[=====     ]  50.0% (...)` bar
//! - [`itcm`]: `ItcmLayout`, 32 KiB ITCM block rounding
//! - [`command`]: `SizeCommand`, `CommandRunner`, `SystemRunner`
//! - [`config`]: `SizeConfig` (JSON), compiled `SizePatterns`
//! - [`report`]: `SizeReport`, `SizeReporter`

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod extract;
pub mod format;
pub mod itcm;
pub mod report;

pub use command::{size_output, CommandOutput, CommandRunner, SizeCommand, SystemRunner};
pub use config::{PatternConfig, SizeConfig, SizePatterns};
pub use extract::{calculate_size, SectionPattern};
pub use format::{filled_cells, format_usage, BAR_CELLS};
pub use itcm::{ItcmLayout, ITCM_BLOCK_SIZE};
pub use report::{MemoryLimits, ReportMode, SizeReport, SizeReporter};

/// Error type for size configuration and extraction.
#[derive(Debug, thiserror::Error)]
pub enum SizeError {
    /// A section pattern is not a valid regular expression.
    #[error("invalid section pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The pattern as configured.
        pattern: String,
        /// Regex compile error.
        source: regex::Error,
    },
    /// A capture group matched text that is not a base-10 integer.
    #[error("invalid pattern: capture group {group} matched `{value}` (not a number) in line `{line}`")]
    NonNumericCapture {
        /// 1-based capture group index.
        group: usize,
        /// The captured text.
        value: String,
        /// The report line that matched.
        line: String,
    },
    /// The size configuration file could not be read.
    #[error("failed to read size configuration {path}: {source}")]
    Io {
        /// Configuration path.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The size configuration is not valid JSON.
    #[error("invalid size configuration: {0}")]
    Json(#[from] serde_json::Error),
}
