//! Output configuration from TOML (`[output]` section)

use conformity_domain::{ConfigIssue, ConfigIssueCode, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where results, summaries and transcripts go
///
/// # Example
///
/// ```toml
/// [output]
/// dir = "output"
/// base_filename = "CommonSense_results"
/// format = "table"
/// transcript = "output/transcript.jsonl"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub dir: PathBuf,
    /// Result file prefix, followed by `_<len><suffix>_<protocol>.json`
    pub base_filename: String,
    /// Metrics display format (`table` or `json`)
    pub format: String,
    /// JSONL transcript path; unset disables transcripts
    pub transcript: Option<PathBuf>,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            base_filename: "CommonSense_results".to_string(),
            format: "table".to_string(),
            transcript: None,
        }
    }
}

impl FileOutputConfig {
    pub fn parse_format(&self) -> (OutputFormat, Vec<ConfigIssue>) {
        match self.format.parse::<OutputFormat>() {
            Ok(format) => (format, vec![]),
            Err(_) => (
                OutputFormat::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "output.format".to_string(),
                        value: self.format.clone(),
                    },
                    format!("output.format: unknown format '{}', using table", self.format),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_format().1;
        if self.base_filename.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "output.base_filename".to_string(),
                },
                "output.base_filename cannot be empty",
            ));
        }
        issues
    }
}
