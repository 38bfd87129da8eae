//! Model value object identifying the model under test

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name fragment of models known to prepend a `<think>` reasoning segment.
const REASONING_MODEL_MARKER: &str = "DeepSeek-R1";

/// The served model an experiment is run against (Value Object)
///
/// Model names are whatever the serving endpoint accepts, so this wraps a
/// free-form identifier rather than enumerating a fixed catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Model(String);

impl Model {
    /// Create a model identifier
    ///
    /// # Panics
    /// Panics if the name is empty or only whitespace
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(!name.trim().is_empty(), "Model name cannot be empty");
        Self(name)
    }

    /// Try to create a model identifier, returning None if the name is blank
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default experiment line-up
    pub fn default_models() -> Vec<Model> {
        vec![
            Model::new("DeepSeek-R1-Distill-Qwen-14B"),
            Model::new("Qwen2-7B-Instruct"),
            Model::new("glm-4-9b-chat"),
        ]
    }

    /// Whether this model is known to emit a reasoning segment before its answer
    pub fn emits_reasoning(&self) -> bool {
        self.0.contains(REASONING_MODEL_MARKER)
    }

    /// Directory-safe form of the name (path separators replaced)
    pub fn file_stem(&self) -> String {
        self.0.replace(['/', '\\', ':'], "_")
    }
}

impl Default for Model {
    /// Mid-sized instruct model used when none is configured
    fn default() -> Self {
        Model::new("Qwen2-7B-Instruct")
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Model::try_new(s.trim()).ok_or_else(|| "model name cannot be empty".to_string())
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
