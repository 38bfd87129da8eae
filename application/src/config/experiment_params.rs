//! Experiment parameters: runner control.
//!
//! [`ExperimentParams`] groups the static parameters of
//! [`ExperimentRunner`](crate::use_cases::run_experiment::ExperimentRunner).

use conformity_domain::MitigationMethod;
use serde::{Deserialize, Serialize};

/// Runner control parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentParams {
    /// Maximum number of items in flight at once.
    pub concurrency: usize,
    /// Completions sampled per item under self-consistency.
    pub votes: usize,
    /// Mitigation applied to every non-Raw protocol.
    pub method: MitigationMethod,
    /// Base seed for per-item RNGs; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Historical rounds rendered for Trust / Doubt.
    pub history_rounds: usize,
}

impl Default for ExperimentParams {
    fn default() -> Self {
        Self {
            concurrency: 5,
            votes: 5,
            method: MitigationMethod::Baseline,
            seed: None,
            history_rounds: 5,
        }
    }
}

impl ExperimentParams {
    // ==================== Builder Methods ====================

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_votes(mut self, votes: usize) -> Self {
        self.votes = votes;
        self
    }

    pub fn with_method(mut self, method: MitigationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_history_rounds(mut self, rounds: usize) -> Self {
        self.history_rounds = rounds;
        self
    }

    // ==================== Derived ====================

    /// Completions requested per item: several only under self-consistency
    pub fn effective_votes(&self) -> usize {
        if self.method.is_self_consistency() {
            self.votes.max(1)
        } else {
            1
        }
    }

    /// Worker pool size, never zero
    pub fn pool_size(&self) -> usize {
        self.concurrency.max(1)
    }
}
