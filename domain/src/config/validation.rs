//! Structured configuration issues.
//!
//! The configuration loader reports problems as a list of [`ConfigIssue`]s
//! instead of failing on the first one, so the CLI can print every warning
//! and abort only on errors.
//!
//! ```
//! use conformity_domain::config::{ConfigIssue, ConfigIssueCode, Severity};
//!
//! let issue = ConfigIssue::error(
//!     ConfigIssueCode::OutOfRange { field: "experiment.concurrency".into() },
//!     "experiment.concurrency must be at least 1",
//! );
//! assert!(issue.is_error());
//! ```

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the run cannot start with this configuration.
    Error,
    /// Non-fatal: a default is used instead.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A string field does not name a known variant (method, protocol, format).
    InvalidEnumValue { field: String, value: String },
    /// A numeric field is outside its accepted range.
    OutOfRange { field: String },
    /// A required string field is blank.
    EmptyValue { field: String },
    /// The peer panel cannot produce opinions.
    InvalidPanel,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_severity() {
        let issue = ConfigIssue::warning(
            ConfigIssueCode::InvalidEnumValue {
                field: "experiment.method".into(),
                value: "vibes".into(),
            },
            "unknown method 'vibes', using baseline",
        );
        assert!(!issue.is_error());
        assert_eq!(issue.to_string(), "warning: unknown method 'vibes', using baseline");
    }
}
