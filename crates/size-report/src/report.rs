//! Memory usage report.

use std::path::Path;

use crate::itcm::{ItcmLayout, ITCM_PADDING_SCALE};
use crate::{calculate_size, format_usage, size_output, CommandRunner, SectionPattern};
use crate::{SizeCommand, SizePatterns};

/// Board memory maximums. Zero means "not configured" and hides the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryLimits {
    /// `upload.maximum_size`.
    pub flash: u64,
    /// `upload.maximum_ram_size`.
    pub ram: u64,
}

/// Report layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// `RAM:` and `Flash:` lines.
    #[default]
    Standard,
    /// `RAM 1:`, `RAM 2:` and `Flash:` with ITCM padding charged to RAM1
    /// (Teensy 4.x).
    Itcm,
}

/// Per-region usage extracted from one size tool run.
///
/// `None` means the region is unavailable: no output, no pattern, or a
/// pattern that failed on this output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeReport {
    /// Flash usage.
    pub program: Option<u64>,
    /// RAM1 usage before ITCM padding.
    pub data: Option<u64>,
    /// RAM2 usage.
    pub ram2: Option<u64>,
    /// ITCM code size.
    pub itcm: Option<u64>,
    /// Trimmed tool output.
    pub raw: Option<String>,
}

impl SizeReport {
    /// Apply each pattern to `output`.
    ///
    /// A pattern that fails on this output is logged and leaves its region
    /// unavailable; the other regions are still reported.
    #[must_use]
    pub fn from_output(output: Option<String>, patterns: &SizePatterns) -> Self {
        let text = output.as_deref();
        Self {
            program: region(text, patterns.program.as_ref(), "program"),
            data: region(text, patterns.data.as_ref(), "data"),
            ram2: region(text, patterns.ram2.as_ref(), "ram2"),
            itcm: region(text, patterns.itcm.as_ref(), "itcm"),
            raw: output,
        }
    }

    /// ITCM block layout. Unavailable ITCM is laid out as zero bytes.
    #[must_use]
    pub fn itcm_layout(&self) -> ItcmLayout {
        ItcmLayout::new(self.itcm.unwrap_or(0))
    }

    /// RAM1 usage with the ITCM padding charged to it.
    #[must_use]
    pub fn ram1_usage(&self) -> Option<u64> {
        self.data.map(|data| self.itcm_layout().charge(data))
    }

    /// Render the report.
    ///
    /// A line is emitted only when its maximum is configured and its usage
    /// is available. `verbose` appends diagnostic lines and the raw output.
    #[must_use]
    pub fn lines(&self, mode: ReportMode, limits: MemoryLimits, verbose: bool) -> Vec<String> {
        let mut lines = Vec::new();
        let mut usage = |label: &str, used: Option<u64>, total: u64| {
            if let (Some(used), true) = (used, total > 0) {
                lines.push(format!("{label}{}", format_usage(used, total)));
            }
        };

        match mode {
            ReportMode::Itcm => {
                usage("RAM 1:  ", self.ram1_usage(), limits.ram);
                usage("RAM 2:  ", self.ram2, limits.ram);
                usage("Flash:  ", self.program, limits.flash);
            }
            ReportMode::Standard => {
                usage("RAM:   ", self.data, limits.ram);
                usage("Flash: ", self.program, limits.flash);
            }
        }

        if verbose {
            if mode == ReportMode::Itcm {
                let padding = self.itcm_layout().padding;
                lines.push(format!(
                    "ITCM P: {}",
                    format_usage(padding, ITCM_PADDING_SCALE)
                ));
            }
            lines.push(String::new());
            if let Some(raw) = &self.raw {
                lines.push(raw.clone());
            }
        }
        lines
    }
}

fn region(output: Option<&str>, pattern: Option<&SectionPattern>, name: &str) -> Option<u64> {
    match calculate_size(output, pattern) {
        Ok(size) => {
            tracing::debug!(region = name, ?size, "measured");
            size
        }
        Err(e) => {
            tracing::warn!(region = name, error = %e, "section pattern failed, region unavailable");
            None
        }
    }
}

/// Runs the size tool and renders a [`SizeReport`].
#[derive(Debug, Clone)]
pub struct SizeReporter<R> {
    runner: R,
    command: SizeCommand,
    patterns: SizePatterns,
    mode: ReportMode,
    limits: MemoryLimits,
    verbose: bool,
}

impl<R: CommandRunner> SizeReporter<R> {
    /// A reporter in [`ReportMode::Standard`] with no limits configured.
    #[must_use]
    pub fn new(runner: R, command: SizeCommand, patterns: SizePatterns) -> Self {
        Self {
            runner,
            command,
            patterns,
            mode: ReportMode::default(),
            limits: MemoryLimits::default(),
            verbose: false,
        }
    }

    /// Set the report layout.
    #[must_use]
    pub fn mode(mut self, mode: ReportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the board memory maximums.
    #[must_use]
    pub fn limits(mut self, limits: MemoryLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Append diagnostics and the raw tool output.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Measure `source`. Never fails; a tool failure yields a report with
    /// every region unavailable.
    #[must_use]
    pub fn measure(&self, source: &Path) -> SizeReport {
        let output = size_output(&self.runner, &self.command, source);
        SizeReport::from_output(output, &self.patterns)
    }

    /// Measure `source` and render the report lines.
    #[must_use]
    pub fn report(&self, source: &Path) -> Vec<String> {
        self.measure(source)
            .lines(self.mode, self.limits, self.verbose)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const LIMITS: MemoryLimits = MemoryLimits {
        flash: 8_126_464,
        ram: 524_288,
    };

    fn report(program: u64, data: u64, ram2: u64, itcm: u64) -> SizeReport {
        SizeReport {
            program: Some(program),
            data: Some(data),
            ram2: Some(ram2),
            itcm: Some(itcm),
            raw: Some(".text 1".to_owned()),
        }
    }

    #[test]
    fn itcm_lines_in_order() {
        let lines = report(100_000, 20_000, 12_000, 32_768).lines(ReportMode::Itcm, LIMITS, false);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("RAM 1:  ["));
        assert!(lines[0].ends_with("(used 20000 bytes from 524288 bytes)"));
        assert!(lines[1].starts_with("RAM 2:  ["));
        assert!(lines[2].starts_with("Flash:  ["));
    }

    #[test]
    fn padding_is_charged_to_ram1_only() {
        let r = report(0, 1000, 500, 1);
        assert_eq!(r.ram1_usage(), Some(1000 + 32_767));
        let lines = r.lines(ReportMode::Itcm, LIMITS, false);
        assert!(lines[0].contains("(used 33767 bytes"));
        assert!(lines[1].contains("(used 500 bytes"));
    }

    #[test]
    fn unavailable_itcm_adds_no_padding() {
        let r = SizeReport {
            itcm: None,
            ..report(0, 1000, 0, 0)
        };
        assert_eq!(r.ram1_usage(), Some(1000));
    }

    #[test]
    fn unconfigured_limits_hide_lines() {
        let limits = MemoryLimits { flash: 1000, ram: 0 };
        let lines = report(10, 10, 10, 0).lines(ReportMode::Itcm, limits, false);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Flash:  "));
    }

    #[test]
    fn unavailable_regions_hide_lines() {
        let r = SizeReport {
            ram2: None,
            ..report(10, 10, 10, 0)
        };
        let lines = r.lines(ReportMode::Itcm, LIMITS, false);
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| !l.starts_with("RAM 2:")));
    }

    #[test]
    fn verbose_appends_padding_blank_and_raw() {
        let lines = report(10, 10, 10, 40_000).lines(ReportMode::Itcm, LIMITS, true);
        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[3],
            "ITCM P: [========  ]  77.9% (used 25536 bytes from 32767 bytes)"
        );
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], ".text 1");
    }

    #[test]
    fn standard_mode_has_two_lines_without_padding() {
        let lines = report(2048, 1024, 99, 1).lines(ReportMode::Standard, LIMITS, false);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("RAM:   ["));
        assert!(lines[0].ends_with("(used 1024 bytes from 524288 bytes)"));
        assert!(lines[1].starts_with("Flash: ["));
    }

    #[test]
    fn empty_report_renders_nothing() {
        assert!(SizeReport::default()
            .lines(ReportMode::Itcm, LIMITS, false)
            .is_empty());
    }

    #[test]
    fn failing_pattern_only_blanks_its_region() {
        let patterns = SizePatterns {
            program: Some(SectionPattern::new(r"^\.text\s+([0-9]+)").unwrap()),
            data: Some(SectionPattern::new(r"^(\.data)\s+([0-9]+)").unwrap()),
            ..SizePatterns::default()
        };
        let r = SizeReport::from_output(Some(".text 10\n.data 20".to_owned()), &patterns);
        assert_eq!(r.program, Some(10));
        assert_eq!(r.data, None);
        assert_eq!(r.ram2, None);
    }
}
