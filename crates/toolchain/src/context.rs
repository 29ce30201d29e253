//! The narrow view of the build orchestrator the configuration needs.
//!
//! The orchestrator owns the project model, package installation and the
//! build graph. Configuration only ever asks it four things: which board is
//! being built, which defines the user set, where a package lives and which
//! version it is. [`BuildContext`] is exactly that surface.

use std::path::PathBuf;

use board::{BoardConfig, HostSystem};
use serde::Deserialize;

use crate::{Define, ToolchainError};

/// Read-only access to the enclosing build.
pub trait BuildContext {
    /// The board being built.
    fn board(&self) -> &BoardConfig;

    /// The host the toolchain runs on.
    fn host(&self) -> &HostSystem;

    /// Preprocessor defines set by the user (build flags, project options).
    fn defines(&self) -> &[Define];

    /// Install directory of `package`, if it is installed.
    fn package_dir(&self, package: &str) -> Option<PathBuf>;

    /// Installed version of `package`, if known.
    fn package_version(&self, package: &str) -> Option<String>;
}

/// Packages installed under one root, one directory per package, each with
/// a `package.json` carrying its version.
#[derive(Debug, Clone)]
pub struct PackageDirectory {
    root: PathBuf,
}

#[derive(Deserialize)]
struct PackageJson {
    version: String,
}

impl PackageDirectory {
    /// Packages under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<package>` if it is a directory.
    #[must_use]
    pub fn dir(&self, package: &str) -> Option<PathBuf> {
        let dir = self.root.join(package);
        dir.is_dir().then_some(dir)
    }

    /// The `version` field of `<root>/<package>/package.json`.
    ///
    /// Returns `Ok(None)` if the package or its `package.json` is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ToolchainError::Io`] or [`ToolchainError::Json`] if the
    /// manifest exists but cannot be read or parsed.
    pub fn version(&self, package: &str) -> Result<Option<String>, ToolchainError> {
        let path = self.root.join(package).join("package.json");
        if !path.is_file() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ToolchainError::Io {
            path: path.clone(),
            source,
        })?;
        let manifest: PackageJson = serde_json::from_str(&text)
            .map_err(|source| ToolchainError::Json { path, source })?;
        Ok(Some(manifest.version))
    }
}

/// An owned [`BuildContext`] assembled from files on disk.
#[derive(Debug, Clone)]
pub struct StaticContext {
    /// Board being built.
    pub board: BoardConfig,
    /// Host system.
    pub host: HostSystem,
    /// User defines.
    pub defines: Vec<Define>,
    /// Installed packages.
    pub packages: PackageDirectory,
}

impl BuildContext for StaticContext {
    fn board(&self) -> &BoardConfig {
        &self.board
    }

    fn host(&self) -> &HostSystem {
        &self.host
    }

    fn defines(&self) -> &[Define] {
        &self.defines
    }

    fn package_dir(&self, package: &str) -> Option<PathBuf> {
        self.packages.dir(package)
    }

    fn package_version(&self, package: &str) -> Option<String> {
        match self.packages.version(package) {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(package, error = %e, "ignoring unreadable package manifest");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn reads_installed_package_version() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("framework-arduinoteensy-ts");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{"name": "x", "version": "1.159.0"}"#).unwrap();

        let packages = PackageDirectory::new(tmp.path());
        assert_eq!(packages.dir("framework-arduinoteensy-ts"), Some(pkg));
        assert_eq!(
            packages.version("framework-arduinoteensy-ts").unwrap().as_deref(),
            Some("1.159.0")
        );
    }

    #[test]
    fn missing_package_is_none() {
        let tmp = TempDir::new().unwrap();
        let packages = PackageDirectory::new(tmp.path());
        assert_eq!(packages.dir("tool-teensy"), None);
        assert_eq!(packages.version("tool-teensy").unwrap(), None);
    }

    #[test]
    fn malformed_package_json_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("tool-teensy");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), "{}").unwrap();

        let packages = PackageDirectory::new(tmp.path());
        assert!(matches!(
            packages.version("tool-teensy"),
            Err(ToolchainError::Json { .. })
        ));
    }
}
