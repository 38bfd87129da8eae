//! Inference parameters: retry and response post-processing.

use super::retry::RetryPolicy;
use conformity_domain::Model;

/// Reasoning-segment removal for models that think out loud
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningFilter {
    /// Model-name fragments that enable the filter
    pub model_patterns: Vec<String>,
    pub open_marker: String,
    pub close_marker: String,
}

impl Default for ReasoningFilter {
    fn default() -> Self {
        Self {
            model_patterns: vec!["DeepSeek-R1".to_string()],
            open_marker: "<think>".to_string(),
            close_marker: "</think>".to_string(),
        }
    }
}

impl ReasoningFilter {
    pub fn applies_to(&self, model: &Model) -> bool {
        self.model_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && model.as_str().contains(pattern.as_str()))
    }
}

/// Parameters of [`InferenceClient`](crate::use_cases::complete::InferenceClient)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceParams {
    pub retry: RetryPolicy,
    pub reasoning: ReasoningFilter,
}

impl InferenceParams {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_reasoning(mut self, reasoning: ReasoningFilter) -> Self {
        self.reasoning = reasoning;
        self
    }
}
