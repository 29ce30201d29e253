//! Debug adapter configuration.
//!
//! Boards that list `jlink` among their upload protocols get a J-Link GDB
//! server tool unless their manifest already defines one.

use board::{BoardConfig, DebugServer, DebugTool, HostSystem};
use serde::{Deserialize, Serialize};

use crate::ToolchainError;

/// GDB port of the J-Link server.
pub const JLINK_GDB_PORT: &str = "2331";

/// Fill in default debug tools for `board`.
///
/// # Errors
///
/// Returns [`ToolchainError::MissingJlinkDevice`] if the board supports J-Link
/// uploads but its manifest has no `debug.jlink_device`.
pub fn add_default_debug_tools(
    mut board: BoardConfig,
    host: &HostSystem,
) -> Result<BoardConfig, ToolchainError> {
    let supports_jlink = board.upload.protocols.iter().any(|p| p == "jlink");
    if supports_jlink && !board.debug.tools.contains_key("jlink") {
        let device = board
            .debug
            .jlink_device
            .clone()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ToolchainError::MissingJlinkDevice(board.id.clone()))?;

        let executable = if host.is_windows() {
            "JLinkGDBServerCL.exe"
        } else {
            "JLinkGDBServer"
        };
        let arguments = [
            "-singlerun", "-if", "SWD", "-select", "USB", "-device", device.as_str(), "-port",
            JLINK_GDB_PORT,
        ]
        .map(str::to_owned)
        .to_vec();

        tracing::debug!(board = %board.id, %device, "added default J-Link debug tool");
        board.debug.tools.insert(
            "jlink".to_owned(),
            DebugTool {
                server: Some(DebugServer {
                    package: Some("tool-jlink".to_owned()),
                    executable: executable.to_owned(),
                    arguments,
                    ..DebugServer::default()
                }),
                ..DebugTool::default()
            },
        );
    }
    Ok(board)
}

/// Options of one debug session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugOptions {
    /// Adapter speed (`debug_speed` project option).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    /// GDB server to launch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<DebugServer>,
}

/// Apply the adapter speed to a J-Link server's arguments.
///
/// Other servers and sessions without a speed are returned unchanged.
#[must_use]
pub fn configure_debug_options(initial: &DebugOptions) -> DebugOptions {
    let mut options = initial.clone();
    let Some(speed) = initial.speed.as_deref().filter(|s| !s.is_empty()) else {
        return options;
    };
    if let Some(server) = options.server.as_mut() {
        if server.executable.to_lowercase().contains("jlink") {
            server
                .arguments
                .extend(["-speed".to_owned(), speed.to_owned()]);
        }
    }
    options
}
