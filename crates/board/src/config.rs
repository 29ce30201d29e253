//! Board manifest model.
//!
//! Only the keys read by the toolchain configuration are typed. Unknown keys
//! are kept in the `extra` maps so a manifest can be written back unchanged
//! (the `boards` command prints manifests with debug tools filled in).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::BoardError;

/// One board manifest (`<id>.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Board id, taken from the manifest file stem (e.g. `teensy41`).
    #[serde(skip)]
    pub id: String,

    /// Human readable board name (e.g. "Teensy 4.1").
    #[serde(default)]
    pub name: String,

    /// `build.*` keys.
    #[serde(default)]
    pub build: BuildSection,

    /// `upload.*` keys.
    #[serde(default)]
    pub upload: UploadSection,

    /// `debug.*` keys.
    #[serde(default)]
    pub debug: DebugSection,

    /// Frameworks the board supports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frameworks: Vec<String>,

    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `build.*` section of a board manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Framework core: `teensy` (AVR), `teensy3` or `teensy4` (Cortex-M).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<String>,

    /// CPU name passed to `-mcpu` (e.g. `cortex-m7`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    /// MCU name passed to `-mmcu` on AVR (e.g. `at90usb1286`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcu: Option<String>,

    /// CPU clock as written in the manifest (e.g. `600000000L`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_cpu: Option<String>,

    /// Variant directory name under the framework's `variants/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    /// Explicit linker script. Takes precedence over `arduino.ldscript`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldscript: Option<String>,

    /// `build.arduino.*` keys.
    #[serde(default)]
    pub arduino: ArduinoSection,

    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `build.arduino.*` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArduinoSection {
    /// Linker script used by the Arduino framework.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldscript: Option<String>,

    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `upload.*` section of a board manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadSection {
    /// Flash size in bytes. `0` means "not configured".
    #[serde(default)]
    pub maximum_size: u64,

    /// RAM size in bytes. `0` means "not configured".
    #[serde(default)]
    pub maximum_ram_size: u64,

    /// Default upload protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// Every upload protocol the board supports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocols: Vec<String>,

    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `debug.*` section of a board manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugSection {
    /// J-Link device id (`-device` argument of the GDB server).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jlink_device: Option<String>,

    /// Tools selected by default for debugging.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_tools: Vec<String>,

    /// Debug tool definitions keyed by tool name.
    #[serde(default)]
    pub tools: BTreeMap<String, DebugTool>,

    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A debug tool entry (`debug.tools.<name>`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugTool {
    /// GDB server launched for this tool, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<DebugServer>,

    /// Keys not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// GDB server invocation for a debug tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugServer {
    /// Package that provides the executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,

    /// Server executable name.
    #[serde(default)]
    pub executable: String,

    /// Server arguments.
    #[serde(default)]
    pub arguments: Vec<String>,

    /// Keys not modelled above (`ready_pattern`, `cwd`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BoardConfig {
    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Json`] if `text` is not a valid manifest.
    pub fn from_json(id: &str, text: &str) -> Result<Self, BoardError> {
        let mut board: Self = serde_json::from_str(text).map_err(|source| BoardError::Json {
            id: id.to_owned(),
            source,
        })?;
        board.id = id.to_owned();
        Ok(board)
    }

    /// Read and parse a manifest file. The board id is the file stem.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::NoBoardId`] for a path without a UTF-8 file stem,
    /// [`BoardError::Io`] if the file cannot be read and [`BoardError::Json`]
    /// if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, BoardError> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| BoardError::NoBoardId(path.to_path_buf()))?;
        let text = std::fs::read_to_string(path).map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(id, &text)
    }

    /// `build.core`, treating an empty string as unset.
    #[must_use]
    pub fn core(&self) -> Option<&str> {
        non_empty(self.build.core.as_deref())
    }

    /// `build.cpu`, or `""` when unset.
    #[must_use]
    pub fn cpu(&self) -> &str {
        self.build.cpu.as_deref().unwrap_or("")
    }

    /// `build.mcu`, or `""` when unset.
    #[must_use]
    pub fn mcu(&self) -> &str {
        self.build.mcu.as_deref().unwrap_or("")
    }

    /// `build.f_cpu`, or `""` when unset.
    #[must_use]
    pub fn f_cpu(&self) -> &str {
        self.build.f_cpu.as_deref().unwrap_or("")
    }

    /// `build.variant`, treating an empty string as unset.
    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        non_empty(self.build.variant.as_deref())
    }

    /// `build.ldscript`, treating an empty string as unset.
    #[must_use]
    pub fn ldscript(&self) -> Option<&str> {
        non_empty(self.build.ldscript.as_deref())
    }

    /// `build.arduino.ldscript`, treating an empty string as unset.
    #[must_use]
    pub fn arduino_ldscript(&self) -> Option<&str> {
        non_empty(self.build.arduino.ldscript.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
