//! Include rewriting for the Teensy 2.x (AVR) core.
//!
//! The AVR core sources include their headers as `#include "../foo.h"`, which
//! only resolves in the layout Teensyduino installs them in. The framework
//! package flattens that layout, so the relative prefix is stripped in place.

use std::fs;
use std::path::Path;

use crate::ToolchainError;

const RELATIVE_INCLUDE: &[u8] = b"#include \"../";
const FLAT_INCLUDE: &[u8] = b"#include \"";

/// Rewrite `#include "../` to `#include "` in every regular file directly
/// inside `core_dir`. Files are treated as raw bytes, so non-UTF-8 sources
/// survive unchanged. Returns the number of files rewritten.
///
/// # Errors
///
/// Returns [`ToolchainError::Io`] if the directory cannot be listed or a file
/// cannot be read or written.
pub fn patch_core_includes(core_dir: &Path) -> Result<usize, ToolchainError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ToolchainError::Io { path, source }
    };

    let mut entries = fs::read_dir(core_dir)
        .map_err(io_err(core_dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err(core_dir))?;
    entries.sort();

    let mut patched = 0_usize;
    for path in entries.iter().filter(|p| p.is_file()) {
        let content = fs::read(path).map_err(io_err(path))?;
        let Some(rewritten) = strip_relative_includes(&content) else {
            continue;
        };
        fs::write(path, rewritten).map_err(io_err(path))?;
        tracing::debug!(file = %path.display(), "rewrote relative includes");
        patched = patched.saturating_add(1);
    }
    Ok(patched)
}

/// `None` if `content` has no relative include.
fn strip_relative_includes(content: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(content.len());
    let mut rest = content;
    let mut changed = false;
    while let Some(pos) = find(rest, RELATIVE_INCLUDE) {
        let (head, tail) = rest.split_at(pos);
        out.extend_from_slice(head);
        out.extend_from_slice(FLAT_INCLUDE);
        rest = tail.get(RELATIVE_INCLUDE.len()..).unwrap_or_default();
        changed = true;
    }
    out.extend_from_slice(rest);
    changed.then_some(out)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn strips_every_relative_include() {
        let src = b"#include \"../usb_api.h\"\nint x;\n#include \"../core_pins.h\"\n";
        let out = strip_relative_includes(src).unwrap();
        assert_eq!(out, b"#include \"usb_api.h\"\nint x;\n#include \"core_pins.h\"\n");
    }

    #[test]
    fn untouched_content_is_none() {
        assert_eq!(strip_relative_includes(b"#include \"usb_api.h\"\n"), None);
        assert_eq!(strip_relative_includes(b""), None);
    }

    #[test]
    fn patches_files_in_place_and_keeps_latin1_bytes() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        fs::write(dir.join("usb.c"), b"/* \xe9 */\n#include \"../usb_common.h\"\n").unwrap();
        fs::write(dir.join("pins.c"), b"#include \"pins.h\"\n").unwrap();
        fs::create_dir(dir.join("sub")).unwrap();
        fs::write(dir.join("sub").join("deep.c"), b"#include \"../x.h\"\n").unwrap();

        assert_eq!(patch_core_includes(dir).unwrap(), 1);
        assert_eq!(
            fs::read(dir.join("usb.c")).unwrap(),
            b"/* \xe9 */\n#include \"usb_common.h\"\n"
        );
        // Only the top level of the core directory is rewritten.
        assert_eq!(fs::read(dir.join("sub").join("deep.c")).unwrap(), b"#include \"../x.h\"\n");
        // Idempotent.
        assert_eq!(patch_core_includes(dir).unwrap(), 0);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = patch_core_includes(&tmp.path().join("teensy")).unwrap_err();
        assert!(matches!(err, ToolchainError::Io { .. }));
    }
}
