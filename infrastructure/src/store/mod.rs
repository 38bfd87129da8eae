//! JSON file result store.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<model>/<base>_<len><suffix>_<protocol>.json   one protocol run
//! <root>/metrics_summary_<model><suffix>.json           metrics summary
//! ```
//!
//! `<len>` is the number of entries in the run and `<suffix>` the mitigation
//! method's suffix (empty for the baseline), e.g.
//! `output/glm-4-9b-chat/CommonSense_results_2000role_Trust.json`.

use conformity_application::{ResultStore, StoreError};
use conformity_domain::{MetricsSummary, MitigationMethod, Model, Protocol, ResultEntry};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// [`ResultStore`] writing pretty-printed JSON files
pub struct JsonResultStore {
    root: PathBuf,
    base_filename: String,
}

impl JsonResultStore {
    pub fn new(root: impl Into<PathBuf>, base_filename: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_filename: base_filename.into(),
        }
    }

    fn model_dir(&self, model: &Model) -> PathBuf {
        self.root.join(model.file_stem())
    }

    fn run_path(
        &self,
        model: &Model,
        method: MitigationMethod,
        protocol: Protocol,
        len: usize,
    ) -> PathBuf {
        self.model_dir(model).join(format!(
            "{}_{}{}_{}.json",
            self.base_filename,
            len,
            method.suffix(),
            protocol.as_str()
        ))
    }

    fn summary_path(&self, summary: &MetricsSummary) -> PathBuf {
        self.root.join(format!(
            "metrics_summary_{}{}.json",
            summary.model.file_stem(),
            summary.method.suffix()
        ))
    }

    fn run_pattern(&self, method: MitigationMethod, protocol: Protocol) -> Result<Regex, StoreError> {
        let pattern = format!(
            r"^{}_\d+{}_{}\.json$",
            regex::escape(&self.base_filename),
            regex::escape(method.suffix()),
            regex::escape(protocol.as_str())
        );
        Regex::new(&pattern).map_err(|e| StoreError::Malformed {
            path: self.root.clone(),
            message: format!("bad file pattern: {}", e),
        })
    }

    /// Most recently modified file in `dir` matching `pattern`
    fn latest_match(dir: &Path, pattern: &Regex) -> Result<Option<PathBuf>, StoreError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        let mut best: Option<(SystemTime, PathBuf)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if !name.to_str().is_some_and(|n| pattern.is_match(n)) {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            if best.as_ref().is_none_or(|(t, _)| modified >= *t) {
                best = Some((modified, entry.path()));
            }
        }
        Ok(best.map(|(_, path)| path))
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ResultStore for JsonResultStore {
    fn save(
        &self,
        model: &Model,
        method: MitigationMethod,
        protocol: Protocol,
        entries: &[ResultEntry],
    ) -> Result<PathBuf, StoreError> {
        let path = self.run_path(model, method, protocol, entries.len());
        Self::write_json(&path, entries)?;
        debug!("Saved {} entries to {}", entries.len(), path.display());
        Ok(path)
    }

    fn load(
        &self,
        model: &Model,
        method: MitigationMethod,
        protocol: Protocol,
    ) -> Result<Option<Vec<ResultEntry>>, StoreError> {
        let pattern = self.run_pattern(method, protocol)?;
        let Some(path) = Self::latest_match(&self.model_dir(model), &pattern)? else {
            return Ok(None);
        };

        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let entries = serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        debug!("Loaded {}", path.display());
        Ok(Some(entries))
    }

    fn models(&self) -> Result<Vec<Model>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut models: Vec<Model> = entries
            .flatten()
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| match e.file_name().into_string() {
                Ok(name) => Model::try_new(name),
                Err(name) => {
                    warn!("Skipping non UTF-8 directory {:?}", name);
                    None
                }
            })
            .collect();
        models.sort();
        Ok(models)
    }

    fn save_summary(&self, summary: &MetricsSummary) -> Result<PathBuf, StoreError> {
        let path = self.summary_path(summary);
        Self::write_json(&path, summary)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conformity_domain::{Choice, QuestionItem, summarize};
    use std::collections::BTreeMap;

    fn entries(answers: &[&str]) -> Vec<ResultEntry> {
        answers
            .iter()
            .enumerate()
            .map(|(i, answer)| {
                let item = QuestionItem::new(
                    format!("q{}", i),
                    "Q?",
                    vec![Choice::new("A", "a"), Choice::new("B", "b")],
                    "A",
                );
                ResultEntry::new(&item, Some(format!("({}) x", answer)), answer.to_string())
            })
            .collect()
    }

    fn model() -> Model {
        Model::new("glm-4-9b-chat")
    }

    #[test]
    fn test_save_path_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonResultStore::new(dir.path(), "CommonSense_results");

        let path = store
            .save(&model(), MitigationMethod::Role, Protocol::Trust, &entries(&["A", "B"]))
            .unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("glm-4-9b-chat")
                .join("CommonSense_results_2role_Trust.json")
        );

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"correct_ans\": \"A\""));
        assert!(written.contains("\"model_ans\": \"B\""));
        assert!(written.contains("\"protocol_result\""));
    }

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonResultStore::new(dir.path(), "CommonSense_results");
        let saved = entries(&["A", "B", ""]);

        store
            .save(&model(), MitigationMethod::Baseline, Protocol::Raw, &saved)
            .unwrap();
        let loaded = store
            .load(&model(), MitigationMethod::Baseline, Protocol::Raw)
            .unwrap()
            .unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_load_distinguishes_methods() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonResultStore::new(dir.path(), "CommonSense_results");

        store
            .save(&model(), MitigationMethod::Reflection, Protocol::Doubt, &entries(&["B"]))
            .unwrap();

        assert!(
            store
                .load(&model(), MitigationMethod::Baseline, Protocol::Doubt)
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .load(&model(), MitigationMethod::Reflection, Protocol::Trust)
                .unwrap()
                .is_none()
        );
        assert_eq!(
            store
                .load(&model(), MitigationMethod::Reflection, Protocol::Doubt)
                .unwrap()
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_load_reads_files_written_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("Qwen2-7B-Instruct");
        fs::create_dir_all(&model_dir).unwrap();
        fs::write(
            model_dir.join("CommonSense_results_2000_Wrong_Guidance.json"),
            r#"[{"id": "q1", "question": "Q?", "choices": [{"label": "A", "text": "a"}],
                 "correct_ans": "A", "protocol_result": "(A) a", "model_ans": "A"}]"#,
        )
        .unwrap();

        let store = JsonResultStore::new(dir.path(), "CommonSense_results");
        let loaded = store
            .load(
                &Model::new("Qwen2-7B-Instruct"),
                MitigationMethod::Baseline,
                Protocol::WrongGuidance,
            )
            .unwrap()
            .unwrap();
        assert_eq!(loaded[0].answer_key, "A");
        assert!(loaded[0].is_correct());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("glm-4-9b-chat");
        fs::create_dir_all(&model_dir).unwrap();
        fs::write(model_dir.join("CommonSense_results_1_Raw.json"), "not json").unwrap();

        let store = JsonResultStore::new(dir.path(), "CommonSense_results");
        let err = store
            .load(&model(), MitigationMethod::Baseline, Protocol::Raw)
            .unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonResultStore::new(dir.path().join("never-created"), "r");
        assert!(store.models().unwrap().is_empty());
        assert!(
            store
                .load(&model(), MitigationMethod::Baseline, Protocol::Raw)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_models_lists_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonResultStore::new(dir.path(), "CommonSense_results");
        store
            .save(&Model::new("b-model"), MitigationMethod::Baseline, Protocol::Raw, &entries(&["A"]))
            .unwrap();
        store
            .save(&Model::new("a-model"), MitigationMethod::Baseline, Protocol::Raw, &entries(&["A"]))
            .unwrap();
        fs::write(dir.path().join("stray.json"), "[]").unwrap();

        assert_eq!(
            store.models().unwrap(),
            vec![Model::new("a-model"), Model::new("b-model")]
        );
    }

    #[test]
    fn test_save_summary_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonResultStore::new(dir.path(), "CommonSense_results");
        let mut runs = BTreeMap::new();
        runs.insert(Protocol::Raw, entries(&["A", "B"]));
        let summary = summarize(&model(), MitigationMethod::SelfConsistency, &runs);

        let path = store.save_summary(&summary).unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("metrics_summary_glm-4-9b-chatself-consistency.json")
        );
        assert!(fs::read_to_string(&path).unwrap().contains("\"protocol_type\""));
    }
}
