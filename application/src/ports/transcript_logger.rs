//! Port for structured transcript logging.
//!
//! Defines the [`TranscriptLogger`] trait for recording what each item was
//! asked and answered. This is separate from `tracing` operation logs: the
//! transcript is a machine-readable audit trail (JSONL), one record per event.

use serde_json::Value;

/// A structured transcript event.
///
/// The adapter adds the timestamp when the event is written.
pub struct TranscriptEvent {
    /// Event type identifier (e.g., "item_completed", "protocol_finished").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl TranscriptEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging transcript events.
///
/// `log` is synchronous and infallible; write failures are the adapter's
/// concern and never interrupt a run.
pub trait TranscriptLogger: Send + Sync {
    fn log(&self, event: TranscriptEvent);
}

/// No-op implementation for tests and when transcripts are disabled.
pub struct NoTranscriptLogger;

impl TranscriptLogger for NoTranscriptLogger {
    fn log(&self, _event: TranscriptEvent) {}
}
