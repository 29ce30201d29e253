//! Which toolchain packages a build needs.
//!
//! The platform manifest lists every package any Teensy build could use:
//! the AVR toolchain, one prebuilt Cortex-M toolchain per host, the generic
//! `toolchain-gccarmnoneeabi`, the J-Link tools, and so on.
//! [`configure_default_packages`] prunes that list for one board, host and
//! framework selection and returns the result; the input is left untouched.

use std::collections::BTreeMap;

use board::{BoardConfig, HostSystem};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ToolchainError;

const AVR_TOOLCHAIN: &str = "toolchain-atmelavr";
const GENERIC_ARM_TOOLCHAIN: &str = "toolchain-gccarmnoneeabi";
const ARM_MAC: &str = "toolchain-arm-cortexm-mac";
const ARM_MAC_ARM64: &str = "toolchain-arm-cortexm-macos-arm64";
const ARM_WIN64: &str = "toolchain-arm-cortexm-win64";
const ARM_LINUX: &str = "toolchain-arm-cortexm-linux";
const JLINK: &str = "tool-jlink";

/// One package entry of the platform manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Version requirement.
    #[serde(default)]
    pub version: String,

    /// Optional packages are only installed on demand.
    #[serde(default)]
    pub optional: bool,

    /// Keys not modelled above (`type`, `owner`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Package name → spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageManifest(pub BTreeMap<String, PackageSpec>);

#[derive(Deserialize)]
struct PlatformJson {
    packages: PackageManifest,
}

impl PackageManifest {
    /// Extract the `packages` table of a `platform.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolchainError::Json`] (with `path` as given) if the text is
    /// not a platform manifest.
    pub fn from_platform_json(
        path: &std::path::Path,
        text: &str,
    ) -> Result<Self, ToolchainError> {
        serde_json::from_str::<PlatformJson>(text)
            .map(|platform| platform.packages)
            .map_err(|source| ToolchainError::Json {
                path: path.to_path_buf(),
                source,
            })
    }

    /// `true` if `name` is listed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Look a package up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageSpec> {
        self.0.get(name)
    }

    /// Package names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    fn remove(&mut self, name: &str) {
        if self.0.remove(name).is_some() {
            tracing::debug!(package = name, "dropped package");
        }
    }

    fn set_version(&mut self, name: &str, version: &str) {
        match self.0.get_mut(name) {
            Some(spec) => version.clone_into(&mut spec.version),
            None => tracing::debug!(package = name, "cannot pin version of unlisted package"),
        }
    }

    fn require(&mut self, name: &str) {
        match self.0.get_mut(name) {
            Some(spec) => spec.optional = false,
            None => tracing::debug!(package = name, "cannot require unlisted package"),
        }
    }
}

/// Project options that influence package selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRequest {
    /// Frameworks the project uses (`arduino`, `mbed`, `zephyr`).
    pub frameworks: Vec<String>,
    /// `upload_protocol` project option.
    pub upload_protocol: Option<String>,
    /// `debug_tool` project option.
    pub debug_tool: Option<String>,
}

/// Prune `manifest` for `board` on `host`.
#[must_use]
pub fn configure_default_packages(
    manifest: &PackageManifest,
    request: &PackageRequest,
    board: Option<&BoardConfig>,
    host: &HostSystem,
) -> PackageManifest {
    let mut packages = manifest.clone();

    if let Some(board) = board {
        let unused_toolchain = if board.core() == Some("teensy") {
            GENERIC_ARM_TOOLCHAIN
        } else {
            AVR_TOOLCHAIN
        };
        packages.remove(unused_toolchain);

        for name in foreign_toolchains(host) {
            packages.remove(name);
        }
    }

    let uses = |framework: &str| request.frameworks.iter().any(|f| f == framework);
    if uses("mbed") {
        packages.set_version(GENERIC_ARM_TOOLCHAIN, ">=1.60301.0,<1.80000.0");
    } else if uses("zephyr") {
        for name in ["tool-cmake", "tool-dtc", "tool-ninja"] {
            packages.require(name);
        }
        if !host.is_windows() {
            packages.require("tool-gperf");
        }
        packages.set_version(GENERIC_ARM_TOOLCHAIN, "~1.80201.0");
    } else if uses("arduino") && board.and_then(BoardConfig::core) == Some("teensy4") {
        packages.require("tool-teensy");
    }

    if !wants_jlink(request, board) {
        packages.remove(JLINK);
    }

    packages
}

/// Cortex-M toolchains that cannot run on `host`. The generic
/// `toolchain-gccarmnoneeabi` is superseded by the host-specific builds on
/// every recognised host.
fn foreign_toolchains(host: &HostSystem) -> &'static [&'static str] {
    if host.is_linux_x86() {
        &[ARM_MAC, ARM_MAC_ARM64, ARM_WIN64, GENERIC_ARM_TOOLCHAIN]
    } else if host.is_linux_arm() {
        &[ARM_MAC, ARM_MAC_ARM64, ARM_WIN64, ARM_LINUX, GENERIC_ARM_TOOLCHAIN]
    } else if host.is_macos_x86() {
        &[ARM_MAC_ARM64, ARM_LINUX, ARM_WIN64, GENERIC_ARM_TOOLCHAIN]
    } else if host.is_macos_arm() {
        &[ARM_MAC, ARM_LINUX, ARM_WIN64, GENERIC_ARM_TOOLCHAIN]
    } else if host.is_windows() {
        &[ARM_LINUX, ARM_MAC, ARM_MAC_ARM64, GENERIC_ARM_TOOLCHAIN]
    } else {
        &[]
    }
}

fn wants_jlink(request: &PackageRequest, board: Option<&BoardConfig>) -> bool {
    let option_mentions_jlink =
        |option: &Option<String>| option.as_deref().is_some_and(|v| v.contains("jlink"));

    option_mentions_jlink(&request.upload_protocol)
        || option_mentions_jlink(&request.debug_tool)
        || board.is_some_and(|board| {
            board.debug.default_tools.iter().any(|t| t == "jlink")
                || option_mentions_jlink(&board.upload.protocol)
        })
}
