//! Domain layer for conformity-bench
//!
//! This crate contains the pure logic of the benchmark: question items,
//! protocol composition, answer extraction and metrics. It performs no I/O;
//! randomness is always injected.
//!
//! # Core Concepts
//!
//! ## Protocols
//!
//! A subject model answers a multiple-choice question after reading the
//! (fabricated) opinions of a panel of peers:
//!
//! - **Raw**: no peers, the baseline
//! - **Correct / Wrong Guidance**: every peer asserts the same correct or wrong answer
//! - **Trust / Doubt**: several historical rounds establish whether the peers
//!   are reliable, then the final round reverses that pattern
//!
//! ## Metrics
//!
//! - **Accuracy**: predictions equal to the answer key
//! - **Conformity rate**: answers that flipped toward the peer majority,
//!   relative to the Raw baseline
//! - **Independence rate**: Raw-correct items that survive both Trust and Doubt

pub mod config;
pub mod core;
pub mod extraction;
pub mod metrics;
pub mod protocol;
pub mod result;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    error::DomainError,
    model::Model,
    question::{Choice, Dataset, QuestionItem},
};
pub use extraction::{backfill_answers, extract_answer, extract_loose, strip_reasoning};
pub use metrics::{
    ConformityTally, MetricsSummary, ProtocolMetrics, Rate, compute_independence_rate,
    compute_metrics, conformity_tally, summarize,
};
pub use protocol::{MajorityDirection, MitigationMethod, PeerPanel, Protocol, ProtocolComposer};
pub use result::{FailureKind, ItemFailure, ResultEntry};
pub use session::entities::{Conversation, Message, Role};
