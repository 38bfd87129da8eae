//! Application-level configuration.
//!
//! Configuration types that control how use cases behave:
//!
//! - [`ExperimentParams`]: runner control (pool size, votes, method, seed)
//! - [`InferenceParams`]: retry policy and reasoning-segment filtering
//! - [`RetryPolicy`] / [`Backoff`] / [`RetryState`]: attempt scheduling

pub mod experiment_params;
pub mod inference_params;
pub mod retry;

pub use experiment_params::ExperimentParams;
pub use inference_params::{InferenceParams, ReasoningFilter};
pub use retry::{Backoff, RetryPolicy, RetryState};
