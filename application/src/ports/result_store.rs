//! Result store port
//!
//! Persistence of per-protocol result files and metrics summaries.

use conformity_domain::{MetricsSummary, MitigationMethod, Model, Protocol, ResultEntry};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by result store adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed result file {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

/// Where finished protocol runs are kept
///
/// Callers pass the method a run was produced with; use
/// [`storage_method`] so Raw always maps to the baseline slot.
pub trait ResultStore: Send + Sync {
    /// Persist one protocol run, returning where it was written
    fn save(
        &self,
        model: &Model,
        method: MitigationMethod,
        protocol: Protocol,
        entries: &[ResultEntry],
    ) -> Result<PathBuf, StoreError>;

    /// Load a stored run, `None` when nothing was stored for it
    fn load(
        &self,
        model: &Model,
        method: MitigationMethod,
        protocol: Protocol,
    ) -> Result<Option<Vec<ResultEntry>>, StoreError>;

    /// Models with at least one stored run
    fn models(&self) -> Result<Vec<Model>, StoreError>;

    /// Persist a metrics summary, returning where it was written
    fn save_summary(&self, summary: &MetricsSummary) -> Result<PathBuf, StoreError>;
}

/// Method slot a protocol's results are stored under.
///
/// Raw is never mitigated, so every method shares the baseline Raw run.
pub fn storage_method(protocol: Protocol, method: MitigationMethod) -> MitigationMethod {
    if protocol.is_baseline() {
        MitigationMethod::Baseline
    } else {
        method
    }
}
