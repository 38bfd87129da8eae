//! TOML-deserializable configuration file types
//!
//! Each section lives in its own submodule. [`FileConfig`] is the merged
//! result of every configuration source; `validate()` collects issues from
//! all sections instead of failing on the first.

mod experiment;
mod inference;
mod output;
mod panel;
mod provider;

pub use experiment::FileExperimentConfig;
pub use inference::FileInferenceConfig;
pub use output::FileOutputConfig;
pub use panel::FilePanelConfig;
pub use provider::{FileProviderConfig, FileSamplingConfig};

use crate::gateway::{OpenAiGatewayConfig, SamplingParams};
use conformity_application::{ExperimentParams, InferenceParams};
use conformity_domain::{ConfigIssue, MitigationMethod, Model, OutputFormat, PeerPanel, Protocol};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete configuration file
///
/// # Example
///
/// ```toml
/// [experiment]
/// models = ["Qwen2-7B-Instruct"]
/// protocols = ["Raw", "Trust", "Doubt"]
/// method = "reflection"
///
/// [provider]
/// base_url = "http://localhost:8000/v1"
///
/// [sampling]
/// temperature = 0.6
///
/// [output]
/// dir = "output"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub experiment: FileExperimentConfig,
    pub inference: FileInferenceConfig,
    pub provider: FileProviderConfig,
    pub sampling: FileSamplingConfig,
    pub panel: FilePanelConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Collect issues across every section
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.experiment.validate();
        issues.extend(self.inference.validate());
        issues.extend(self.provider.validate());
        issues.extend(self.sampling.validate());
        issues.extend(self.panel.parse_panel().1);
        issues.extend(self.output.validate());
        issues
    }

    pub fn has_errors(&self) -> bool {
        self.validate().iter().any(ConfigIssue::is_error)
    }

    pub fn to_experiment_params(&self) -> ExperimentParams {
        self.experiment.to_params()
    }

    pub fn to_inference_params(&self) -> InferenceParams {
        self.inference.to_params()
    }

    /// Gateway settings with the API key resolved from config or environment
    pub fn to_gateway_config(&self) -> OpenAiGatewayConfig {
        OpenAiGatewayConfig {
            base_url: self.provider.base_url.clone(),
            api_key: self.provider.resolve_api_key(),
            headers: self.provider.headers.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            sampling: SamplingParams {
                temperature: self.sampling.temperature,
                top_p: self.sampling.top_p,
                max_tokens: self.sampling.max_tokens,
                frequency_penalty: self.sampling.frequency_penalty,
                top_k: self.sampling.top_k,
            },
        }
    }

    pub fn to_panel(&self) -> PeerPanel {
        self.panel.parse_panel().0
    }

    pub fn method(&self) -> MitigationMethod {
        self.experiment.parse_method().0
    }

    pub fn protocols(&self) -> Vec<Protocol> {
        self.experiment.parse_protocols().0
    }

    pub fn models(&self) -> Vec<Model> {
        self.experiment.parse_models().0
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output.parse_format().0
    }
}
