//! Configuration value objects for the domain layer
//!
//! Used by both the configuration loader and the presentation layer.

mod output_format;
pub mod validation;

pub use output_format::OutputFormat;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
