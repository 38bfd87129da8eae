//! Serving endpoint configuration from TOML (`[provider]` and `[sampling]` sections)

use conformity_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OpenAI-compatible endpoint the models are served from
///
/// # Example
///
/// ```toml
/// [provider]
/// base_url = "https://ai.gitee.com/v1"
/// api_key_env = "serverless_api"
/// timeout_secs = 120
///
/// [provider.headers]
/// X-Failover-Enabled = "true"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key; takes precedence over `api_key_env`
    pub api_key: Option<String>,
    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ai.gitee.com/v1".to_string(),
            api_key_env: "serverless_api".to_string(),
            api_key: None,
            headers: BTreeMap::from([("X-Failover-Enabled".to_string(), "true".to_string())]),
            timeout_secs: 120,
        }
    }
}

impl FileProviderConfig {
    /// Inline key, else the environment variable named by `api_key_env`
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.base_url.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "provider.base_url".to_string(),
                },
                "provider.base_url cannot be empty",
            ));
        }
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "provider.timeout_secs".to_string(),
                },
                "provider.timeout_secs: 0 disables the request timeout",
            ));
        }
        issues
    }
}

/// Sampling parameters forwarded with every completion request
///
/// `top_k` is not part of the OpenAI schema; endpoints that accept it
/// read it from the request body alongside the standard fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub frequency_penalty: f32,
    pub top_k: Option<u32>,
}

impl Default for FileSamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.6,
            top_p: 0.7,
            max_tokens: 1024,
            frequency_penalty: 0.0,
            top_k: Some(50),
        }
    }
}

impl FileSamplingConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if !(0.0..=2.0).contains(&self.temperature) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "sampling.temperature".to_string(),
                },
                format!(
                    "sampling.temperature {} is outside 0.0..=2.0",
                    self.temperature
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "sampling.top_p".to_string(),
                },
                format!("sampling.top_p {} is outside 0.0..=1.0", self.top_p),
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_key_wins() {
        let config = FileProviderConfig {
            api_key: Some("sk-inline".to_string()),
            api_key_env: "CONFORMITY_TEST_KEY_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-inline"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let config = FileProviderConfig {
            api_key: Some("  ".to_string()),
            api_key_env: "CONFORMITY_TEST_KEY_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_default_failover_header() {
        let config = FileProviderConfig::default();
        assert_eq!(
            config.headers.get("X-Failover-Enabled").map(String::as_str),
            Some("true")
        );
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_sampling_range_warnings() {
        let sampling = FileSamplingConfig {
            temperature: 3.5,
            top_p: 1.2,
            ..Default::default()
        };
        let issues = sampling.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| !i.is_error()));
        assert!(FileSamplingConfig::default().validate().is_empty());
    }
}
