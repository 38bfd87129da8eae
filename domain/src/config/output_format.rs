//! Output format value object

use serde::{Deserialize, Serialize};

/// How metrics summaries are printed to the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned table, one row per protocol (default)
    #[default]
    Table,
    /// Pretty-printed summary JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid OutputFormat: {}", s)),
        }
    }
}
