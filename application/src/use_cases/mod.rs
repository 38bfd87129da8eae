//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod backfill;
pub mod complete;
pub mod compute_metrics;
pub mod run_experiment;
