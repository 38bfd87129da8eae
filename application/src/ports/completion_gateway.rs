//! Completion Gateway port
//!
//! Defines the interface for sending one conversation to a served model.

use async_trait::async_trait;
use conformity_domain::{Conversation, Model};
use thiserror::Error;

/// Errors that can occur during a completion call
///
/// Every variant is retried by the inference client; they are kept distinct
/// so logs show why an attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for single-shot chat completions
///
/// This port defines how the application layer reaches the model-serving
/// endpoint. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Send `conversation` to `model` and return the reply text
    async fn complete(
        &self,
        model: &Model,
        conversation: &Conversation,
    ) -> Result<String, GatewayError>;
}
