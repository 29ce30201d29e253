//! Section size extraction from size tool output.

use regex::Regex;

use crate::SizeError;

/// A compiled section pattern.
///
/// Every capture group of a match is read as a byte count, so a pattern like
/// `^(?:\.text|\.data)\s+([0-9]+)` sums the size column of `.text` and
/// `.data`.
#[derive(Debug, Clone)]
pub struct SectionPattern {
    regex: Regex,
}

impl SectionPattern {
    /// Compile `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`SizeError::InvalidPattern`] if `pattern` does not compile.
    pub fn new(pattern: &str) -> Result<Self, SizeError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| SizeError::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })
    }

    /// The pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Sum the captured numbers of every line of `output` matched by `pattern`.
///
/// Returns `Ok(None)` ("unavailable") when `output` is absent or blank or
/// when no pattern is configured. Lines are trimmed, blank lines skipped and
/// lines the pattern does not match ignored. Capture groups that did not
/// take part in a match contribute nothing. The total saturates at
/// `u64::MAX`.
///
/// # Errors
///
/// Returns [`SizeError::NonNumericCapture`] if a capture group matched text
/// that is not a base-10 integer: such a pattern is misconfigured.
pub fn calculate_size(
    output: Option<&str>,
    pattern: Option<&SectionPattern>,
) -> Result<Option<u64>, SizeError> {
    let (Some(output), Some(pattern)) = (output.filter(|o| !o.trim().is_empty()), pattern) else {
        return Ok(None);
    };

    let mut total = 0_u64;
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(captures) = pattern.regex.captures(line) else {
            continue;
        };
        for (group, capture) in captures.iter().enumerate().skip(1) {
            let Some(capture) = capture else {
                continue;
            };
            let value: u64 =
                capture
                    .as_str()
                    .parse()
                    .map_err(|_| SizeError::NonNumericCapture {
                        group,
                        value: capture.as_str().to_owned(),
                        line: line.to_owned(),
                    })?;
            tracing::trace!(line, group, value, "matched section");
            total = total.saturating_add(value);
        }
    }
    Ok(Some(total))
}
