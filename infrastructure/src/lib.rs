//! Infrastructure layer for conformity-bench
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the completion gateway, dataset loading,
//! the JSON result store and the transcript logger, plus configuration
//! file loading.

pub mod config;
pub mod dataset;
pub mod gateway;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use dataset::{DatasetError, JsonDatasetLoader};
pub use gateway::{OpenAiCompatibleGateway, OpenAiGatewayConfig, SamplingParams};
pub use logging::JsonlTranscriptLogger;
pub use store::JsonResultStore;
