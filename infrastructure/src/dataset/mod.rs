//! Dataset loading from JSON files.
//!
//! The file is a JSON array of question items:
//!
//! ```json
//! [
//!   {
//!     "id": "q1",
//!     "question": "Where do fish live?",
//!     "choices": [{"label": "A", "text": "tree"}, {"label": "B", "text": "water"}],
//!     "answerKey": "B"
//!   }
//! ]
//! ```

use conformity_domain::{Dataset, DomainError, QuestionItem};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Loads a dataset and subsamples it down to `data_length` items
#[derive(Debug, Clone)]
pub struct JsonDatasetLoader {
    data_length: usize,
    seed: Option<u64>,
}

impl JsonDatasetLoader {
    pub fn new(data_length: usize) -> Self {
        Self {
            data_length,
            seed: None,
        }
    }

    /// Fix the subsample so repeated runs see the same items
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn load(&self, path: &Path) -> Result<Dataset, DatasetError> {
        let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let items: Vec<QuestionItem> =
            serde_json::from_str(&content).map_err(|source| DatasetError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let total = items.len();
        let items = self.subsample(items);
        info!(
            "Loaded {} of {} items from {}",
            items.len(),
            total,
            path.display()
        );

        Ok(Dataset::new(items)?)
    }

    /// Uniform sample without replacement, kept in file order
    fn subsample(&self, items: Vec<QuestionItem>) -> Vec<QuestionItem> {
        if items.len() <= self.data_length {
            return items;
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut picked = index::sample(&mut rng, items.len(), self.data_length).into_vec();
        picked.sort_unstable();

        let mut keep = vec![false; items.len()];
        for i in picked {
            keep[i] = true;
        }
        items
            .into_iter()
            .zip(keep)
            .filter_map(|(item, keep)| keep.then_some(item))
            .collect()
    }
}
