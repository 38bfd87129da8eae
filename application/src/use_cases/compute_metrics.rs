//! Compute Metrics use case
//!
//! Loads every stored protocol run of a model and derives its summary.

use crate::ports::result_store::{ResultStore, StoreError, storage_method};
use conformity_domain::{MetricsSummary, MitigationMethod, Model, Protocol, ResultEntry, summarize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while computing metrics
#[derive(Error, Debug)]
pub enum ComputeMetricsError {
    #[error("No stored results for model {0}")]
    NoResults(Model),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Use case for deriving a model's [`MetricsSummary`] from stored runs
pub struct ComputeMetricsUseCase {
    store: Arc<dyn ResultStore>,
}

impl ComputeMetricsUseCase {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Summary for `model` under `method`; Raw is read from the baseline slot
    pub fn execute(
        &self,
        model: &Model,
        method: MitigationMethod,
    ) -> Result<MetricsSummary, ComputeMetricsError> {
        let runs = self.load_runs(model, method)?;
        if runs.is_empty() {
            return Err(ComputeMetricsError::NoResults(model.clone()));
        }

        info!(
            "Computing metrics for {} ({} protocols, method {})",
            model,
            runs.len(),
            method
        );
        Ok(summarize(model, method, &runs))
    }

    /// Compute and persist the summary, returning it with its location
    pub fn execute_and_save(
        &self,
        model: &Model,
        method: MitigationMethod,
    ) -> Result<(MetricsSummary, PathBuf), ComputeMetricsError> {
        let summary = self.execute(model, method)?;
        let path = self.store.save_summary(&summary)?;
        info!("Saved metrics summary to {}", path.display());
        Ok((summary, path))
    }

    fn load_runs(
        &self,
        model: &Model,
        method: MitigationMethod,
    ) -> Result<BTreeMap<Protocol, Vec<ResultEntry>>, StoreError> {
        let mut runs = BTreeMap::new();
        for protocol in Protocol::all() {
            let slot = storage_method(protocol, method);
            match self.store.load(model, slot, protocol)? {
                Some(entries) => {
                    debug!("Loaded {} entries for {}", entries.len(), protocol);
                    runs.insert(protocol, entries);
                }
                None => debug!("No stored {} results for {}", protocol, model),
            }
        }
        Ok(runs)
    }
}
