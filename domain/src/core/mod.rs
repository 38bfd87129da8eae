//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: the served model an experiment targets
//! - [`question::QuestionItem`] / [`question::Dataset`]: multiple-choice input data
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
pub mod question;
