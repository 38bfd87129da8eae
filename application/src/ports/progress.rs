//! Progress notification port
//!
//! Defines the interface for reporting progress while protocols run.

use conformity_domain::{Model, Protocol};

/// Callback for progress updates during an experiment
///
/// Implementations live in the presentation layer. Calls arrive from the
/// runner's join loop, one at a time.
pub trait ProgressNotifier: Send + Sync {
    /// Called before the first item of a protocol is scheduled
    fn on_protocol_start(&self, protocol: Protocol, model: &Model, total_items: usize);

    /// Called as each item finishes; `success` is false for failed items
    fn on_item_complete(&self, protocol: Protocol, id: &str, success: bool);

    /// Called once all items of a protocol have been joined
    fn on_protocol_complete(&self, protocol: Protocol, failures: usize);

    /// Called when a protocol is skipped entirely
    fn on_protocol_skipped(&self, _protocol: Protocol, _reason: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_protocol_start(&self, _protocol: Protocol, _model: &Model, _total_items: usize) {}
    fn on_item_complete(&self, _protocol: Protocol, _id: &str, _success: bool) {}
    fn on_protocol_complete(&self, _protocol: Protocol, _failures: usize) {}
}
