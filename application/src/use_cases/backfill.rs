//! Backfill use case
//!
//! Re-runs loose answer extraction over stored results whose prediction is
//! empty, rewriting only the runs that gained answers.

use crate::ports::result_store::{ResultStore, StoreError, storage_method};
use conformity_domain::{MitigationMethod, Model, Protocol, backfill_answers};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Answers filled per protocol
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub filled: BTreeMap<Protocol, usize>,
}

impl BackfillReport {
    pub fn total(&self) -> usize {
        self.filled.values().sum()
    }
}

/// Use case for filling empty predictions in stored runs
pub struct BackfillUseCase {
    store: Arc<dyn ResultStore>,
}

impl BackfillUseCase {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    pub fn execute(
        &self,
        model: &Model,
        method: MitigationMethod,
    ) -> Result<BackfillReport, StoreError> {
        let mut report = BackfillReport::default();

        for protocol in Protocol::all() {
            let slot = storage_method(protocol, method);
            let Some(mut entries) = self.store.load(model, slot, protocol)? else {
                continue;
            };

            let filled = backfill_answers(&mut entries);
            if filled > 0 {
                let path = self.store.save(model, slot, protocol, &entries)?;
                info!("{}: filled {} answers in {}", protocol, filled, path.display());
            } else {
                debug!("{}: every answer already present", protocol);
            }
            report.filled.insert(protocol, filled);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conformity_domain::{Choice, MetricsSummary, QuestionItem, ResultEntry};
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct SingleRunStore {
        entries: Mutex<Vec<ResultEntry>>,
        saves: Mutex<usize>,
    }

    impl ResultStore for SingleRunStore {
        fn save(
            &self,
            _model: &Model,
            _method: MitigationMethod,
            _protocol: Protocol,
            entries: &[ResultEntry],
        ) -> Result<PathBuf, StoreError> {
            *self.entries.lock().unwrap() = entries.to_vec();
            *self.saves.lock().unwrap() += 1;
            Ok(PathBuf::from("run.json"))
        }

        fn load(
            &self,
            _model: &Model,
            _method: MitigationMethod,
            protocol: Protocol,
        ) -> Result<Option<Vec<ResultEntry>>, StoreError> {
            Ok((protocol == Protocol::Doubt).then(|| self.entries.lock().unwrap().clone()))
        }

        fn models(&self) -> Result<Vec<Model>, StoreError> {
            Ok(vec![])
        }

        fn save_summary(&self, _summary: &MetricsSummary) -> Result<PathBuf, StoreError> {
            Ok(PathBuf::new())
        }
    }

    #[test]
    fn test_backfill_saves_once_then_noop() {
        let item = QuestionItem::new(
            "q1",
            "Q?",
            vec![Choice::new("A", "a"), Choice::new("B", "b")],
            "A",
        );
        let store = Arc::new(SingleRunStore {
            entries: Mutex::new(vec![
                ResultEntry::new(&item, Some("I choose B. b".into()), String::new()),
                ResultEntry::new(&item, Some("(A) a".into()), "A".into()),
            ]),
            saves: Mutex::new(0),
        });
        let use_case = BackfillUseCase::new(store.clone());

        let first = use_case
            .execute(&Model::default(), MitigationMethod::Baseline)
            .unwrap();
        assert_eq!(first.filled.get(&Protocol::Doubt), Some(&1));
        assert_eq!(first.total(), 1);
        assert_eq!(store.entries.lock().unwrap()[0].model_answer, "B");

        let second = use_case
            .execute(&Model::default(), MitigationMethod::Baseline)
            .unwrap();
        assert_eq!(second.total(), 0);
        assert_eq!(*store.saves.lock().unwrap(), 1);
    }
}
