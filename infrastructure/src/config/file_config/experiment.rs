//! Experiment configuration from TOML (`[experiment]` section)

use conformity_application::ExperimentParams;
use conformity_domain::{ConfigIssue, ConfigIssueCode, MitigationMethod, Model, Protocol};
use serde::{Deserialize, Serialize};

/// Experiment configuration from TOML
///
/// # Example
///
/// ```toml
/// [experiment]
/// dataset = "CommonSense.json"
/// data_length = 2000
/// models = ["Qwen2-7B-Instruct", "glm-4-9b-chat"]
/// protocols = ["Raw", "Wrong_Guidance", "Trust"]
/// method = "self-consistency"
/// votes = 5
/// concurrency = 16
/// seed = 42
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExperimentConfig {
    /// Path to the JSON dataset
    pub dataset: String,
    /// Items kept after subsampling
    pub data_length: usize,
    /// Models to run, in order
    pub models: Vec<String>,
    /// Protocol names, in execution order
    pub protocols: Vec<String>,
    /// Mitigation method (`""`/`baseline`, `role`, `reflection`, `self-consistency`)
    pub method: String,
    /// Completions per item under self-consistency
    pub votes: usize,
    /// Items in flight at once
    pub concurrency: usize,
    /// Historical rounds for Trust / Doubt
    pub history_rounds: usize,
    /// Seed for subsampling and per-item composition; unset draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for FileExperimentConfig {
    fn default() -> Self {
        let params = ExperimentParams::default();
        Self {
            dataset: "CommonSense.json".to_string(),
            data_length: 2000,
            models: Model::default_models()
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
            protocols: Protocol::all().iter().map(|p| p.as_str().to_string()).collect(),
            method: String::new(),
            votes: params.votes,
            concurrency: 16,
            history_rounds: params.history_rounds,
            seed: Some(42),
        }
    }
}

impl FileExperimentConfig {
    pub fn parse_method(&self) -> (MitigationMethod, Vec<ConfigIssue>) {
        match self.method.parse::<MitigationMethod>() {
            Ok(method) => (method, vec![]),
            Err(_) => (
                MitigationMethod::Baseline,
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "experiment.method".to_string(),
                        value: self.method.clone(),
                    },
                    format!(
                        "experiment.method: unknown method '{}' (expected baseline, role, reflection or self-consistency)",
                        self.method
                    ),
                )],
            ),
        }
    }

    /// Known protocols in configured order; unknown names are reported and dropped
    pub fn parse_protocols(&self) -> (Vec<Protocol>, Vec<ConfigIssue>) {
        let mut protocols = Vec::new();
        let mut issues = Vec::new();
        for name in &self.protocols {
            match name.parse::<Protocol>() {
                Ok(p) if !protocols.contains(&p) => protocols.push(p),
                Ok(_) => {}
                Err(_) => issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "experiment.protocols".to_string(),
                        value: name.clone(),
                    },
                    format!("experiment.protocols: unknown protocol '{}'", name),
                )),
            }
        }
        (protocols, issues)
    }

    pub fn parse_models(&self) -> (Vec<Model>, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let models = self
            .models
            .iter()
            .filter_map(|name| {
                let model = Model::try_new(name.trim());
                if model.is_none() {
                    issues.push(ConfigIssue::error(
                        ConfigIssueCode::EmptyValue {
                            field: "experiment.models".to_string(),
                        },
                        "experiment.models: model name cannot be empty",
                    ));
                }
                model
            })
            .collect();
        (models, issues)
    }

    fn range_issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        for (field, value) in [
            ("experiment.concurrency", self.concurrency),
            ("experiment.votes", self.votes),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::OutOfRange {
                        field: field.to_string(),
                    },
                    format!("{}: 0 is not allowed, using 1", field),
                ));
            }
        }
        if self.data_length == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "experiment.data_length".to_string(),
                },
                "experiment.data_length must be at least 1",
            ));
        }
        issues
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.parse_method().1;
        issues.extend(self.parse_protocols().1);
        issues.extend(self.parse_models().1);
        issues.extend(self.range_issues());
        issues
    }

    pub fn to_params(&self) -> ExperimentParams {
        ExperimentParams::default()
            .with_concurrency(self.concurrency.max(1))
            .with_votes(self.votes.max(1))
            .with_method(self.parse_method().0)
            .with_seed(self.seed)
            .with_history_rounds(self.history_rounds)
    }
}
