//! Per-item experiment results
//!
//! - [`ResultEntry`]: one answered (or failed) item, as persisted
//! - [`ItemFailure`]: why an item produced no usable prediction

use crate::core::question::{Choice, QuestionItem};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix marking a task-level failure in [`ResultEntry::raw_response`]
pub const ERROR_PREFIX: &str = "ERROR: ";

/// Outcome of one item under one protocol.
///
/// Field names on disk match the historical result files so they reload
/// without migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub id: String,
    pub question: String,
    pub choices: Vec<Choice>,
    #[serde(rename = "correct_ans", alias = "answerKey")]
    pub answer_key: String,
    /// Model output; `None` when every inference attempt failed
    #[serde(rename = "protocol_result", default)]
    pub raw_response: Option<String>,
    /// Extracted label, empty when nothing could be extracted
    #[serde(rename = "model_ans", default)]
    pub model_answer: String,
}

impl ResultEntry {
    pub fn new(item: &QuestionItem, raw_response: Option<String>, model_answer: String) -> Self {
        Self {
            id: item.id.clone(),
            question: item.question.clone(),
            choices: item.choices.clone(),
            answer_key: item.answer_key.clone(),
            raw_response,
            model_answer,
        }
    }

    /// Entry for an item whose task failed before or during inference
    pub fn task_error(item: &QuestionItem, message: impl fmt::Display) -> Self {
        Self::new(item, Some(format!("{}{}", ERROR_PREFIX, message)), String::new())
    }

    pub fn is_correct(&self) -> bool {
        !self.model_answer.is_empty() && self.model_answer == self.answer_key
    }

    pub fn has_answer(&self) -> bool {
        !self.model_answer.is_empty()
    }

    /// Whether the response encodes a task-level error rather than model output
    pub fn is_task_error(&self) -> bool {
        self.raw_response
            .as_deref()
            .is_some_and(|r| r.starts_with(ERROR_PREFIX))
    }
}

/// Category of a per-item failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureKind {
    /// Retries exhausted without a response
    Inference,
    /// Composition failed or the task panicked
    Task(String),
    /// A response arrived but no label could be extracted
    ExtractionMiss,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Inference => write!(f, "inference failed"),
            FailureKind::Task(msg) => write!(f, "task error: {}", msg),
            FailureKind::ExtractionMiss => write!(f, "no answer extracted"),
        }
    }
}

/// A failed item, kept for the end-of-run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub id: String,
    pub kind: FailureKind,
}

impl ItemFailure {
    pub fn new(id: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Classify an entry, or `None` when it holds a usable prediction
    pub fn classify(entry: &ResultEntry) -> Option<Self> {
        let kind = match entry.raw_response.as_deref() {
            None => FailureKind::Inference,
            Some(r) if r.starts_with(ERROR_PREFIX) => {
                FailureKind::Task(r[ERROR_PREFIX.len()..].to_string())
            }
            Some(_) if entry.model_answer.is_empty() => FailureKind::ExtractionMiss,
            Some(_) => return None,
        };
        Some(Self::new(entry.id.clone(), kind))
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.kind)
    }
}
