//! Board metadata for the Teensy platform.
//!
//! Board manifests are the JSON files the build orchestrator ships per board
//! (`teensy41.json`, `teensylc.json`, ...). This crate only models the fields
//! the toolchain configuration reads; everything else is ignored.
//!
//! # Modules
//!
//! - [`config`]: `BoardConfig` and its `build` / `upload` / `debug` sections
//! - [`registry`]: `BoardRegistry`, a directory of manifests keyed by id
//! - [`host`]: `HostSystem`, the PlatformIO-style `<os>_<arch>` system type

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]

pub mod config;
pub mod host;
pub mod registry;

pub use config::{BoardConfig, BuildSection, DebugSection, DebugServer, DebugTool, UploadSection};
pub use host::HostSystem;
pub use registry::BoardRegistry;

/// Error type for loading board manifests.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The manifest file could not be read.
    #[error("failed to read board manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The manifest is not valid JSON or does not match the expected shape.
    #[error("invalid board manifest for `{id}`: {source}")]
    Json {
        /// Board id (manifest file stem).
        id: String,
        /// Underlying parse error.
        source: serde_json::Error,
    },
    /// The manifest path has no usable file stem to derive the board id from.
    #[error("cannot derive a board id from {0}")]
    NoBoardId(std::path::PathBuf),
    /// Walking the board directory failed.
    #[error("failed to scan board directory: {0}")]
    Walk(#[from] walkdir::Error),
}
