//! Application layer for conformity-bench
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{Backoff, ExperimentParams, InferenceParams, ReasoningFilter, RetryPolicy, RetryState};
pub use ports::{
    completion_gateway::{CompletionGateway, GatewayError},
    progress::{NoProgress, ProgressNotifier},
    result_store::{ResultStore, StoreError, storage_method},
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use use_cases::backfill::{BackfillReport, BackfillUseCase};
pub use use_cases::complete::InferenceClient;
pub use use_cases::compute_metrics::{ComputeMetricsError, ComputeMetricsUseCase};
pub use use_cases::run_experiment::{ExperimentRunner, ProtocolRun, RunExperimentError};
