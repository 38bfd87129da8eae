//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Inference failures and extraction misses are deliberately absent: they are
/// recorded per item (see [`ItemFailure`](crate::result::ItemFailure)) and
/// never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A protocol was set up without something it cannot run without,
    /// e.g. a long-horizon protocol composed without a history pool.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No correct (or no incorrect) choice could be selected for an item.
    #[error("Choice selection error: {0}")]
    ChoiceSelection(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Invalid peer panel: {0}")]
    InvalidPanel(String),
}

impl DomainError {
    /// Whether this error must abort a whole protocol run rather than a single item
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            DomainError::Configuration(_) | DomainError::InvalidPanel(_)
        )
    }
}
