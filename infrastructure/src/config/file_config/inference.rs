//! Inference configuration from TOML (`[inference]` section)

use conformity_application::{Backoff, InferenceParams, ReasoningFilter, RetryPolicy};
use conformity_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry and response post-processing settings
///
/// # Example
///
/// ```toml
/// [inference]
/// max_retries = 50
/// retry_delay_secs = 2
/// backoff = "exponential"
/// max_delay_secs = 60
/// reasoning_models = ["DeepSeek-R1"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInferenceConfig {
    /// Attempts per completion, including the first
    pub max_retries: u32,
    /// Delay after a failed attempt (initial delay for exponential backoff)
    pub retry_delay_secs: u64,
    /// `fixed` or `exponential`
    pub backoff: String,
    /// Cap for exponential backoff
    pub max_delay_secs: u64,
    /// Model-name fragments whose replies carry a reasoning segment
    pub reasoning_models: Vec<String>,
    pub reasoning_open: String,
    pub reasoning_close: String,
}

impl Default for FileInferenceConfig {
    fn default() -> Self {
        let reasoning = ReasoningFilter::default();
        Self {
            max_retries: 50,
            retry_delay_secs: 2,
            backoff: "fixed".to_string(),
            max_delay_secs: 60,
            reasoning_models: reasoning.model_patterns,
            reasoning_open: reasoning.open_marker,
            reasoning_close: reasoning.close_marker,
        }
    }
}

impl FileInferenceConfig {
    pub fn parse_backoff(&self) -> (Backoff, Vec<ConfigIssue>) {
        let initial = Duration::from_secs(self.retry_delay_secs);
        match self.backoff.trim().to_lowercase().as_str() {
            "fixed" => (Backoff::fixed(initial), vec![]),
            "exponential" => (
                Backoff::exponential(initial, Duration::from_secs(self.max_delay_secs)),
                vec![],
            ),
            other => (
                Backoff::fixed(initial),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "inference.backoff".to_string(),
                        value: other.to_string(),
                    },
                    format!("inference.backoff: unknown strategy '{}', using fixed", other),
                )],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_backoff().1;
        if self.max_retries == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "inference.max_retries".to_string(),
                },
                "inference.max_retries: 0 is not allowed, using 1",
            ));
        }
        issues
    }

    pub fn to_params(&self) -> InferenceParams {
        InferenceParams::default()
            .with_retry(RetryPolicy::new(self.max_retries, self.parse_backoff().0))
            .with_reasoning(ReasoningFilter {
                model_patterns: self.reasoning_models.clone(),
                open_marker: self.reasoning_open.clone(),
                close_marker: self.reasoning_close.clone(),
            })
    }
}
