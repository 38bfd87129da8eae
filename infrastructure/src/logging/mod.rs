//! Structured transcript logging.
//!
//! Provides [`JsonlTranscriptLogger`], a JSONL file writer that implements
//! the [`TranscriptLogger`](conformity_application::TranscriptLogger) port.

mod transcript;

pub use transcript::JsonlTranscriptLogger;
