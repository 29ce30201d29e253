//! Toolchain configuration for the Teensy platform.
//!
//! Everything here is a pure function of its inputs: board metadata, user
//! defines and the host system go in, a finished configuration comes out.
//! The build orchestrator is only reached through [`BuildContext`].
//!
//! # Modules
//!
//! - [`context`]: `BuildContext` trait, package directory lookup
//! - [`define`]: preprocessor `Define`
//! - [`flags`]: `build_flags` / `configure_framework`, the flag-set builder
//! - [`packages`]: `configure_default_packages`, host/framework package pruning
//! - [`debug`]: J-Link debug tool injection and adapter speed
//! - [`core_patch`]: include rewriting for the AVR `teensy` core

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]

pub mod context;
pub mod core_patch;
pub mod debug;
pub mod define;
pub mod flags;
pub mod packages;

use std::path::PathBuf;

pub use context::{BuildContext, PackageDirectory, StaticContext};
pub use core_patch::patch_core_includes;
pub use debug::{add_default_debug_tools, configure_debug_options, DebugOptions};
pub use define::Define;
pub use flags::{
    build_flags, configure_framework, FlagInputs, FlagSet, FrameworkConfig, FrameworkPackages,
    LibrarySource, OptimizationProfile, SizeReportMode,
};
pub use packages::{configure_default_packages, PackageManifest, PackageRequest, PackageSpec};

/// Error type for toolchain configuration.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// A board manifest key the configuration cannot do without is missing.
    #[error("board `{board}` has no `{key}`")]
    MissingBoardField {
        /// Board id.
        board: String,
        /// Dotted manifest key.
        key: &'static str,
    },
    /// The framework version has no numeric minor component.
    #[error("cannot derive TEENSYDUINO from framework version `{0}`")]
    FrameworkVersion(String),
    /// A required package is not installed.
    #[error("package `{0}` is not installed")]
    PackageNotFound(String),
    /// A board advertises J-Link uploads without a J-Link device id.
    #[error("missed J-Link device id for {0}")]
    MissingJlinkDevice(String),
    /// A file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A JSON document could not be parsed.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// Offending path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}
