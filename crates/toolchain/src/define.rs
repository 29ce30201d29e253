//! Preprocessor defines (`NAME` or `NAME=VALUE`).

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

/// A preprocessor define.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Define {
    /// Macro name.
    pub name: String,
    /// Macro value; `None` for a bare define.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Define {
    /// A bare define (`-DNAME`).
    #[must_use]
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// A valued define (`-DNAME=VALUE`).
    #[must_use]
    pub fn valued(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: Some(value.to_string()),
        }
    }

    /// `true` if any define in `defines` is named `name`.
    #[must_use]
    pub fn contains(defines: &[Self], name: &str) -> bool {
        defines.iter().any(|d| d.name == name)
    }
}

impl FromStr for Define {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.split_once('=') {
            Some((name, value)) => Self::valued(name, value),
            None => Self::flag(s),
        })
    }
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => f.write_str(&self.name),
        }
    }
}
