//! Host system type.
//!
//! Package selection depends on which toolchain builds can run on the host.
//! The host is identified by a PlatformIO-style system type string
//! (`linux_x86_64`, `darwin_arm64`, `windows_amd64`, ...). Classification is
//! by substring, so `linux_armv6l` and `linux_armv7l` are both "linux arm"
//! while `linux_aarch64` is neither x86 nor arm.

use core::fmt;

/// A host system type such as `linux_x86_64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostSystem {
    systype: String,
}

impl HostSystem {
    /// Detect the system type of the running host.
    #[must_use]
    pub fn current() -> Self {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Build a system type from Rust's `target_os` / `target_arch` names.
    #[must_use]
    pub fn from_os_arch(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match (os, arch) {
            ("windows", "x86_64") => "amd64",
            ("darwin", "aarch64") => "arm64",
            (_, "arm") => "armv7l",
            (_, "x86") => "x86",
            (_, other) => other,
        };
        Self::from_systype(format!("{os}_{arch}"))
    }

    /// Wrap an explicit system type string.
    #[must_use]
    pub fn from_systype(systype: impl Into<String>) -> Self {
        Self {
            systype: systype.into(),
        }
    }

    /// The raw system type string.
    #[must_use]
    pub fn systype(&self) -> &str {
        &self.systype
    }

    /// `linux_x86_64`.
    #[must_use]
    pub fn is_linux_x86(&self) -> bool {
        self.systype.contains("linux_x86_64")
    }

    /// `linux_arm*` (32-bit ARM Linux).
    #[must_use]
    pub fn is_linux_arm(&self) -> bool {
        self.systype.contains("linux_arm")
    }

    /// `darwin_x86_64`.
    #[must_use]
    pub fn is_macos_x86(&self) -> bool {
        self.systype.contains("darwin_x86_64")
    }

    /// `darwin_arm64` (Apple silicon).
    #[must_use]
    pub fn is_macos_arm(&self) -> bool {
        self.systype.contains("darwin_arm64")
    }

    /// Any Windows host.
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.systype.contains("windows")
    }
}

impl fmt::Display for HostSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.systype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rust_names_to_systype() {
        assert_eq!(HostSystem::from_os_arch("linux", "x86_64").systype(), "linux_x86_64");
        assert_eq!(HostSystem::from_os_arch("macos", "aarch64").systype(), "darwin_arm64");
        assert_eq!(HostSystem::from_os_arch("macos", "x86_64").systype(), "darwin_x86_64");
        assert_eq!(HostSystem::from_os_arch("windows", "x86_64").systype(), "windows_amd64");
        assert_eq!(HostSystem::from_os_arch("linux", "arm").systype(), "linux_armv7l");
        assert_eq!(HostSystem::from_os_arch("linux", "aarch64").systype(), "linux_aarch64");
    }

    #[test]
    fn classification_is_by_substring() {
        let pi = HostSystem::from_systype("linux_armv6l");
        assert!(pi.is_linux_arm());
        assert!(!pi.is_linux_x86());

        let aarch64 = HostSystem::from_systype("linux_aarch64");
        assert!(!aarch64.is_linux_arm());
        assert!(!aarch64.is_linux_x86());

        assert!(HostSystem::from_systype("windows_x86").is_windows());
        assert!(HostSystem::from_systype("darwin_arm64").is_macos_arm());
        assert!(!HostSystem::from_systype("darwin_arm64").is_macos_x86());
    }
}
