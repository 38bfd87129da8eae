//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod completion_gateway;
pub mod progress;
pub mod result_store;
pub mod transcript_logger;
