//! Usage bars.

/// Number of cells in a usage bar.
pub const BAR_CELLS: usize = 10;

/// Filled cells for `used` out of `total`: `round(10 × used / total)`,
/// ties to even, clamped to `[0, BAR_CELLS]`.
///
/// A zero `total` yields an empty bar.
#[must_use]
// The float is clamped to [0, 10] before the cast back.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn filled_cells(used: u64, total: u64) -> usize {
    if total == 0 {
        return 0;
    }
    (ratio(used, total) * 10.0).round_ties_even().clamp(0.0, 10.0) as usize
}

/// Render `used` out of `total` as
/// `[<bar>] <pct> (used <used> bytes from <total> bytes)`.
///
/// The percentage keeps one decimal, is preceded by a sign space and is
/// right-aligned to six columns, so `" 62.3%"` and `"  0.0%"` line up.
/// `used > total` fills the bar and reports a percentage above 100.
///
/// ```
/// use size_report::format_usage;
///
/// assert_eq!(
///     format_usage(512, 1024),
///     "[=====     ]  50.0% (used 512 bytes from 1024 bytes)"
/// );
/// ```
#[must_use]
pub fn format_usage(used: u64, total: u64) -> String {
    let bar = "=".repeat(filled_cells(used, total));
    let pct = format!(" {:.1}%", ratio(used, total) * 100.0);
    format!("[{bar:<BAR_CELLS$}] {pct:>6} (used {used} bytes from {total} bytes)")
}

// Byte counts stay far below 2^53.
#[allow(clippy::cast_precision_loss)]
fn ratio(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64
}
