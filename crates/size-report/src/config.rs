//! Size tool configuration.
//!
//! ```json
//! {
//!   "command": ["arm-none-eabi-size", "-A", "-d", "$SOURCES"],
//!   "patterns": { "program": "...", "data": "...", "ram2": "...", "itcm": "..." }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{SectionPattern, SizeCommand, SizeError};

const TEENSY4: &str = include_str!("../config/teensy4.json");

/// Size tool command and section patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeConfig {
    /// Command template.
    pub command: SizeCommand,
    /// Section patterns per region.
    #[serde(default)]
    pub patterns: PatternConfig,
}

/// Uncompiled section patterns. An empty string counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Sections stored in flash.
    #[serde(default)]
    pub program: Option<String>,
    /// Sections resident in RAM1 (DTCM).
    #[serde(default)]
    pub data: Option<String>,
    /// Sections resident in RAM2 (OCRAM).
    #[serde(default)]
    pub ram2: Option<String>,
    /// Code placed in ITCM.
    #[serde(default)]
    pub itcm: Option<String>,
}

/// Compiled patterns, `None` where unset.
#[derive(Debug, Clone, Default)]
pub struct SizePatterns {
    /// Flash.
    pub program: Option<SectionPattern>,
    /// RAM1.
    pub data: Option<SectionPattern>,
    /// RAM2.
    pub ram2: Option<SectionPattern>,
    /// ITCM.
    pub itcm: Option<SectionPattern>,
}

impl SizeConfig {
    /// The built-in Teensy 4.x profile.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::Json`] if the embedded profile is malformed.
    pub fn teensy4() -> Result<Self, SizeError> {
        Self::from_json(TEENSY4)
    }

    /// Parse a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::Json`] if `text` is not a valid configuration.
    pub fn from_json(text: &str) -> Result<Self, SizeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::Io`] if the file cannot be read, or
    /// [`SizeError::Json`] if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, SizeError> {
        let text = fs::read_to_string(path).map_err(|source| SizeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Compile every configured pattern.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::InvalidPattern`] for the first pattern that does
    /// not compile.
    pub fn compile(&self) -> Result<SizePatterns, SizeError> {
        let compile = |p: &Option<String>| {
            p.as_deref()
                .filter(|p| !p.is_empty())
                .map(SectionPattern::new)
                .transpose()
        };
        Ok(SizePatterns {
            program: compile(&self.patterns.program)?,
            data: compile(&self.patterns.data)?,
            ram2: compile(&self.patterns.ram2)?,
            itcm: compile(&self.patterns.itcm)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::calculate_size;
    use tempfile::TempDir;

    #[test]
    fn teensy4_profile_compiles() {
        let config = SizeConfig::teensy4().unwrap();
        assert_eq!(config.command, SizeCommand::for_tool("arm-none-eabi-size"));
        let patterns = config.compile().unwrap();
        assert!(patterns.program.is_some());
        assert!(patterns.data.is_some());
        assert!(patterns.ram2.is_some());
        assert!(patterns.itcm.is_some());
    }

    #[test]
    fn teensy4_itcm_pattern_only_counts_itcm() {
        let patterns = SizeConfig::teensy4().unwrap().compile().unwrap();
        let out = ".text.itcm   40000   0\n.text.progmem   9216   1610612736\n.text.itcm.x 5 0";
        assert_eq!(
            calculate_size(Some(out), patterns.itcm.as_ref()).unwrap(),
            Some(40_000)
        );
    }

    #[test]
    fn empty_and_missing_patterns_are_unset() {
        let config = SizeConfig::from_json(
            r#"{"command": ["size", "$SOURCES"], "patterns": {"program": "", "data": "^\\.data\\s+([0-9]+)"}}"#,
        )
        .unwrap();
        let patterns = config.compile().unwrap();
        assert!(patterns.program.is_none());
        assert!(patterns.data.is_some());
        assert!(patterns.itcm.is_none());
    }

    #[test]
    fn bad_pattern_fails_compile() {
        let config =
            SizeConfig::from_json(r#"{"command": ["size"], "patterns": {"ram2": "(["}}"#).unwrap();
        assert!(matches!(
            config.compile(),
            Err(SizeError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("size.json");
        fs::write(&path, r#"{"command": ["llvm-size", "-A", "$SOURCES"]}"#).unwrap();
        let config = SizeConfig::load(&path).unwrap();
        assert_eq!(config.command.tokens()[0], "llvm-size");
        assert_eq!(config.patterns, PatternConfig::default());

        assert!(matches!(
            SizeConfig::load(&tmp.path().join("missing.json")),
            Err(SizeError::Io { .. })
        ));
    }
}
