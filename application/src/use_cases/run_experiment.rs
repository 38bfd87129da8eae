//! Run Experiment use case
//!
//! Executes one protocol over a dataset: one task per item on a bounded
//! worker pool, then a join barrier and a sort by id.
//!
//! ```text
//! preflight ──► spawn N tasks ──► [semaphore: `concurrency` permits]
//!                                   compose → complete → extract
//!             ◄── join_next ◄───── ResultEntry (never an error)
//! sort by id ──► ProtocolRun { entries, failures }
//! ```

use crate::config::ExperimentParams;
use crate::ports::completion_gateway::CompletionGateway;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::result_store::{ResultStore, StoreError, storage_method};
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use crate::use_cases::complete::InferenceClient;
use conformity_domain::{
    Dataset, DomainError, ItemFailure, MitigationMethod, Model, PeerPanel, Protocol,
    ProtocolComposer, ResultEntry, extract_answer,
};
use futures::FutureExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Errors that abort a protocol run
///
/// Per-item problems never surface here; they are folded into the entries.
#[derive(Error, Debug)]
pub enum RunExperimentError {
    #[error("Protocol setup failed: {0}")]
    Configuration(#[from] DomainError),

    #[error("Failed to store results: {0}")]
    Store(#[from] StoreError),

    #[error("Result store task failed: {0}")]
    StoreTask(#[from] JoinError),
}

/// Results of one protocol over the whole dataset
#[derive(Debug, Clone)]
pub struct ProtocolRun {
    pub protocol: Protocol,
    /// One entry per dataset item, sorted by id
    pub entries: Vec<ResultEntry>,
    pub failures: Vec<ItemFailure>,
    /// Where the run was stored, if a store is attached
    pub saved_to: Option<PathBuf>,
}

impl ProtocolRun {
    fn new(protocol: Protocol, mut entries: Vec<ResultEntry>) -> Self {
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        let failures = entries.iter().filter_map(ItemFailure::classify).collect();
        Self {
            protocol,
            entries,
            failures,
            saved_to: None,
        }
    }

    pub fn correct(&self) -> usize {
        self.entries.iter().filter(|e| e.is_correct()).count()
    }
}

/// Use case for running protocols against a model
pub struct ExperimentRunner<G: CompletionGateway + 'static> {
    client: Arc<InferenceClient<G>>,
    panel: PeerPanel,
    params: ExperimentParams,
    transcript: Arc<dyn TranscriptLogger>,
    store: Option<Arc<dyn ResultStore>>,
}

impl<G: CompletionGateway + 'static> ExperimentRunner<G> {
    pub fn new(client: Arc<InferenceClient<G>>) -> Self {
        Self {
            client,
            panel: PeerPanel::default(),
            params: ExperimentParams::default(),
            transcript: Arc::new(NoTranscriptLogger),
            store: None,
        }
    }

    pub fn with_panel(mut self, panel: PeerPanel) -> Self {
        self.panel = panel;
        self
    }

    pub fn with_params(mut self, params: ExperimentParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptLogger>) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn params(&self) -> &ExperimentParams {
        &self.params
    }

    /// Composer and vote count for `protocol`; Raw is never mitigated
    fn setup_for(&self, protocol: Protocol) -> (ProtocolComposer, usize) {
        let method = if protocol.is_baseline() {
            MitigationMethod::Baseline
        } else {
            self.params.method
        };
        let composer = ProtocolComposer::new(self.panel.clone())
            .with_method(method)
            .with_history_rounds(self.params.history_rounds);
        let votes = if protocol.is_baseline() {
            1
        } else {
            self.params.effective_votes()
        };
        (composer, votes)
    }

    /// Run one protocol with default (no-op) progress
    pub async fn run(
        &self,
        dataset: Arc<Dataset>,
        protocol: Protocol,
        model: &Model,
    ) -> Result<ProtocolRun, RunExperimentError> {
        self.run_with_progress(dataset, protocol, model, &NoProgress)
            .await
    }

    /// Run one protocol over every item of `dataset`.
    ///
    /// Configuration problems are raised before any task is spawned. After
    /// that the batch always completes: failed items become entries with an
    /// empty answer.
    pub async fn run_with_progress(
        &self,
        dataset: Arc<Dataset>,
        protocol: Protocol,
        model: &Model,
        progress: &dyn ProgressNotifier,
    ) -> Result<ProtocolRun, RunExperimentError> {
        let (composer, votes) = self.setup_for(protocol);
        composer.check_prerequisites(protocol, Some(dataset.as_ref()))?;

        info!(
            "Running {} on {} with {} items (pool {}, votes {}, method {})",
            protocol,
            model,
            dataset.len(),
            self.params.pool_size(),
            votes,
            composer.method()
        );
        progress.on_protocol_start(protocol, model, dataset.len());

        let composer = Arc::new(composer);
        let pool = Arc::new(Semaphore::new(self.params.pool_size()));
        let mut join_set = JoinSet::new();

        for index in 0..dataset.len() {
            let task = ItemTask {
                index,
                protocol,
                votes,
                seed: self.params.seed,
                model: model.clone(),
                dataset: Arc::clone(&dataset),
                composer: Arc::clone(&composer),
                client: Arc::clone(&self.client),
                transcript: Arc::clone(&self.transcript),
            };
            let pool = Arc::clone(&pool);

            join_set.spawn(async move {
                let _permit = pool.acquire_owned().await;
                task.run_guarded().await
            });
        }

        let mut entries = Vec::with_capacity(dataset.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(entry) => {
                    let failure = ItemFailure::classify(&entry);
                    if let Some(failure) = &failure {
                        warn!("{} item {}", protocol, failure);
                    }
                    progress.on_item_complete(protocol, &entry.id, failure.is_none());
                    entries.push(entry);
                }
                // Tasks catch their own panics; this is only reachable on runtime shutdown
                Err(e) => warn!("Task join error: {}", e),
            }
        }

        let run = ProtocolRun::new(protocol, entries);
        info!(
            "{} finished: {}/{} correct, {} failed",
            protocol,
            run.correct(),
            run.entries.len(),
            run.failures.len()
        );
        progress.on_protocol_complete(protocol, run.failures.len());
        self.transcript.log(TranscriptEvent::new(
            "protocol_finished",
            json!({
                "protocol": protocol.as_str(),
                "model": model.as_str(),
                "items": run.entries.len(),
                "correct": run.correct(),
                "failures": run.failures,
            }),
        ));

        Ok(run)
    }

    /// Run `protocols` one after another and store each finished run.
    ///
    /// Raw is skipped when a mitigation method is active: its baseline run is
    /// shared by every method.
    pub async fn run_all(
        &self,
        dataset: Arc<Dataset>,
        protocols: &[Protocol],
        model: &Model,
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<ProtocolRun>, RunExperimentError> {
        for &protocol in protocols {
            let (composer, _) = self.setup_for(protocol);
            composer.check_prerequisites(protocol, Some(dataset.as_ref()))?;
        }

        let mut runs = Vec::with_capacity(protocols.len());
        for &protocol in protocols {
            if protocol.is_baseline() && !self.params.method.is_baseline() {
                info!(
                    "Skipping {}: method {} reuses the baseline run",
                    protocol, self.params.method
                );
                progress.on_protocol_skipped(protocol, "baseline run is shared across methods");
                continue;
            }

            let mut run = self
                .run_with_progress(Arc::clone(&dataset), protocol, model, progress)
                .await?;

            if let Some(store) = &self.store {
                let method = storage_method(protocol, self.params.method);
                let store = Arc::clone(store);
                let model = model.clone();
                let entries = run.entries.clone();
                // Stores write synchronously; keep them off the async workers
                let path = tokio::task::spawn_blocking(move || {
                    store.save(&model, method, protocol, &entries)
                })
                .await??;
                info!("Saved {} results to {}", protocol, path.display());
                run.saved_to = Some(path);
            }
            runs.push(run);
        }
        Ok(runs)
    }
}

/// Everything one item task owns
struct ItemTask<G: CompletionGateway + 'static> {
    index: usize,
    protocol: Protocol,
    votes: usize,
    seed: Option<u64>,
    model: Model,
    dataset: Arc<Dataset>,
    composer: Arc<ProtocolComposer>,
    client: Arc<InferenceClient<G>>,
    transcript: Arc<dyn TranscriptLogger>,
}

impl<G: CompletionGateway + 'static> ItemTask<G> {
    /// Run the item, turning a panic into an error entry
    async fn run_guarded(self) -> ResultEntry {
        let item = self.dataset[self.index].clone();
        match AssertUnwindSafe(self.run()).catch_unwind().await {
            Ok(entry) => entry,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "task panicked".to_string());
                ResultEntry::task_error(&item, message)
            }
        }
    }

    async fn run(self) -> ResultEntry {
        let item = &self.dataset[self.index];

        let conversation = {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(self.index as u64)),
                None => StdRng::from_os_rng(),
            };
            match self
                .composer
                .compose(self.protocol, item, Some(self.dataset.as_ref()), &mut rng)
            {
                Ok(conversation) => conversation,
                Err(e) => return ResultEntry::task_error(item, e),
            }
        };

        let response = self
            .client
            .complete(&conversation, &self.model, self.votes)
            .await;
        let answer = response
            .as_deref()
            .map(|r| extract_answer(r, self.votes))
            .unwrap_or_default();
        debug!(
            protocol = %self.protocol,
            item = %item.id,
            answer = %answer,
            "Item complete"
        );

        self.transcript.log(TranscriptEvent::new(
            "item_completed",
            json!({
                "protocol": self.protocol.as_str(),
                "model": self.model.as_str(),
                "id": item.id,
                "prompt": conversation.prompt_text(),
                "response": response,
                "answer": answer,
                "answer_key": item.answer_key,
            }),
        ));

        ResultEntry::new(item, response, answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InferenceParams, RetryPolicy};
    use crate::ports::completion_gateway::GatewayError;
    use async_trait::async_trait;
    use conformity_domain::{Choice, Conversation, FailureKind, MetricsSummary, QuestionItem};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // ==================== Mock Gateway ====================

    /// Answers each question with the label configured for its text,
    /// tracking peak concurrency
    struct AnsweringGateway {
        answers: HashMap<String, Result<String, GatewayError>>,
        prompts: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
        panic_on: Option<String>,
    }

    impl AnsweringGateway {
        fn new(answers: &[(&str, Result<&str, GatewayError>)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(q, a)| (q.to_string(), a.clone().map(|s| s.to_string())))
                    .collect(),
                prompts: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay: Duration::from_millis(5),
                panic_on: None,
            }
        }

        fn panicking_on(mut self, question: &str) -> Self {
            self.panic_on = Some(question.to_string());
            self
        }
    }

    #[async_trait]
    impl CompletionGateway for AnsweringGateway {
        async fn complete(
            &self,
            _model: &Model,
            conversation: &Conversation,
        ) -> Result<String, GatewayError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let user = conversation.user().to_string();
            self.prompts.lock().unwrap().push(user.clone());

            // The current question is the last "Q: " line of the prompt
            let current = user
                .lines()
                .filter(|l| l.starts_with("Q: "))
                .last()
                .unwrap_or_default()
                .to_string();
            if self.panic_on.as_deref() == Some(current.as_str()) {
                panic!("gateway exploded on {current}");
            }
            self.answers
                .get(&current)
                .cloned()
                .unwrap_or_else(|| Err(GatewayError::Other(format!("unscripted: {current}"))))
        }
    }

    struct RecordingStore {
        saved: Mutex<Vec<(MitigationMethod, Protocol, usize)>>,
    }

    impl ResultStore for RecordingStore {
        fn save(
            &self,
            _model: &Model,
            method: MitigationMethod,
            protocol: Protocol,
            entries: &[ResultEntry],
        ) -> Result<PathBuf, StoreError> {
            self.saved
                .lock()
                .unwrap()
                .push((method, protocol, entries.len()));
            Ok(PathBuf::from(format!("{protocol}.json")))
        }

        fn load(
            &self,
            _model: &Model,
            _method: MitigationMethod,
            _protocol: Protocol,
        ) -> Result<Option<Vec<ResultEntry>>, StoreError> {
            Ok(None)
        }

        fn models(&self) -> Result<Vec<Model>, StoreError> {
            Ok(vec![])
        }

        fn save_summary(&self, _summary: &MetricsSummary) -> Result<PathBuf, StoreError> {
            Ok(PathBuf::from("summary.json"))
        }
    }

    struct CountingTranscript {
        events: Mutex<Vec<&'static str>>,
    }

    impl TranscriptLogger for CountingTranscript {
        fn log(&self, event: TranscriptEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    // ==================== Fixtures ====================

    fn item(id: &str, answer: &str) -> QuestionItem {
        QuestionItem::new(
            id,
            format!("Question {id}?"),
            vec![
                Choice::new("A", "alpha"),
                Choice::new("B", "bravo"),
                Choice::new("C", "charlie"),
            ],
            answer,
        )
    }

    fn dataset(ids: &[&str]) -> Arc<Dataset> {
        Arc::new(Dataset::new(ids.iter().map(|id| item(id, "A")).collect()).unwrap())
    }

    fn reply(label: &str) -> Result<&'static str, GatewayError> {
        Ok(match label {
            "A" => "You: The best answer is: \"(A) alpha\"",
            "B" => "You: The best answer is: \"(B) bravo\"",
            _ => "I would rather not say",
        })
    }

    fn runner(gateway: Arc<AnsweringGateway>, params: ExperimentParams) -> ExperimentRunner<AnsweringGateway> {
        let client = InferenceClient::new(gateway)
            .with_params(InferenceParams::default().with_retry(RetryPolicy::immediate(2)));
        ExperimentRunner::new(Arc::new(client)).with_params(params.with_seed(Some(42)))
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_entries_sorted_and_failures_recorded() {
        let gateway = Arc::new(AnsweringGateway::new(&[
            ("Q: Question q3?", reply("A")),
            ("Q: Question q1?", reply("B")),
            ("Q: Question q2?", reply("?")),
            ("Q: Question q4?", Err(GatewayError::Timeout)),
        ]));
        let runner = runner(gateway, ExperimentParams::default().with_concurrency(2));

        let run = runner
            .run(dataset(&["q4", "q3", "q2", "q1"]), Protocol::CorrectGuidance, &Model::default())
            .await
            .unwrap();

        let ids: Vec<&str> = run.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3", "q4"]);
        let answers: Vec<&str> = run.entries.iter().map(|e| e.model_answer.as_str()).collect();
        assert_eq!(answers, vec!["B", "", "A", ""]);
        assert_eq!(run.correct(), 1);

        assert_eq!(run.failures.len(), 2);
        assert_eq!(run.failures[0].id, "q2");
        assert_eq!(run.failures[0].kind, FailureKind::ExtractionMiss);
        assert_eq!(run.failures[1].id, "q4");
        assert_eq!(run.failures[1].kind, FailureKind::Inference);
        assert!(run.entries[3].raw_response.is_none());
    }

    #[tokio::test]
    async fn test_panicking_item_becomes_error_entry() {
        let gateway = Arc::new(
            AnsweringGateway::new(&[
                ("Q: Question q1?", reply("A")),
                ("Q: Question q3?", reply("B")),
            ])
            .panicking_on("Q: Question q2?"),
        );
        let transcript = Arc::new(CountingTranscript {
            events: Mutex::new(Vec::new()),
        });
        let runner = runner(gateway, ExperimentParams::default().with_concurrency(3))
            .with_transcript(transcript.clone());

        let run = runner
            .run(dataset(&["q1", "q2", "q3"]), Protocol::CorrectGuidance, &Model::default())
            .await
            .unwrap();

        let ids: Vec<&str> = run.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
        assert_eq!(run.entries[0].model_answer, "A");
        assert_eq!(run.entries[2].model_answer, "B");

        let broken = &run.entries[1];
        assert!(broken.is_task_error());
        assert_eq!(broken.model_answer, "");
        assert_eq!(
            broken.raw_response.as_deref(),
            Some("ERROR: gateway exploded on Q: Question q2?")
        );

        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].id, "q2");
        assert_eq!(
            run.failures[0].kind,
            FailureKind::Task("gateway exploded on Q: Question q2?".into())
        );

        // The panicked item never reaches its transcript line
        let events = transcript.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| **e == "item_completed").count(), 2);
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let ids: Vec<String> = (0..12).map(|i| format!("q{i:02}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let questions: Vec<String> = ids.iter().map(|id| format!("Q: Question {id}?")).collect();
        let answers: Vec<(&str, Result<&str, GatewayError>)> =
            questions.iter().map(|q| (q.as_str(), reply("A"))).collect();

        let gateway = Arc::new(AnsweringGateway::new(&answers));
        let runner = runner(gateway.clone(), ExperimentParams::default().with_concurrency(3));

        let run = runner
            .run(dataset(&id_refs), Protocol::Raw, &Model::default())
            .await
            .unwrap();
        assert_eq!(run.correct(), 12);
        assert!(gateway.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_long_horizon_preflight_and_history() {
        let gateway = Arc::new(AnsweringGateway::new(&[
            ("Q: Question q1?", reply("A")),
            ("Q: Question q2?", reply("B")),
        ]));
        let runner = runner(gateway.clone(), ExperimentParams::default());

        let run = runner
            .run(dataset(&["q1", "q2"]), Protocol::Trust, &Model::default())
            .await
            .unwrap();
        assert_eq!(run.entries.len(), 2);

        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts.iter().all(|p| p.contains("—— begin of history ——")));
    }

    #[tokio::test]
    async fn test_invalid_panel_is_fatal_before_scheduling() {
        let gateway = Arc::new(AnsweringGateway::new(&[]));
        let empty_panel: PeerPanel =
            serde_json::from_str(r#"{"names": [], "templates": ["{choice}"]}"#).unwrap();
        let broken = runner(gateway.clone(), ExperimentParams::default()).with_panel(empty_panel);

        let result = broken
            .run(dataset(&["q1"]), Protocol::WrongGuidance, &Model::default())
            .await;
        assert!(matches!(
            result,
            Err(RunExperimentError::Configuration(DomainError::InvalidPanel(_)))
        ));
        assert!(gateway.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_choice_item_still_answered() {
        let single = QuestionItem::new("q1", "Question q1?", vec![Choice::new("A", "alpha")], "A");
        let dataset = Arc::new(Dataset::new(vec![single]).unwrap());

        let gateway = Arc::new(AnsweringGateway::new(&[("Q: Question q1?", reply("A"))]));
        let runner = runner(gateway.clone(), ExperimentParams::default());
        let run = runner
            .run(dataset, Protocol::WrongGuidance, &Model::default())
            .await
            .unwrap();

        assert_eq!(run.entries[0].model_answer, "A");
        assert!(run.failures.is_empty());
        assert!(gateway.prompts.lock().unwrap()[0].contains("Mary: "));
    }

    #[tokio::test]
    async fn test_seeded_runs_are_reproducible() {
        let answers = [
            ("Q: Question q1?", reply("A")),
            ("Q: Question q2?", reply("A")),
            ("Q: Question q3?", reply("A")),
        ];
        let first = Arc::new(AnsweringGateway::new(&answers));
        let second = Arc::new(AnsweringGateway::new(&answers));
        let data = dataset(&["q1", "q2", "q3"]);

        for gateway in [&first, &second] {
            runner(gateway.clone(), ExperimentParams::default().with_concurrency(3))
                .run(Arc::clone(&data), Protocol::Doubt, &Model::default())
                .await
                .unwrap();
        }

        let mut a = first.prompts.lock().unwrap().clone();
        let mut b = second.prompts.lock().unwrap().clone();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_run_all_skips_raw_under_method_and_stores() {
        let gateway = Arc::new(AnsweringGateway::new(&[
            ("Q: Question q1?", reply("A")),
            ("Q: Question q2?", reply("B")),
        ]));
        let store = Arc::new(RecordingStore {
            saved: Mutex::new(Vec::new()),
        });
        let transcript = Arc::new(CountingTranscript {
            events: Mutex::new(Vec::new()),
        });
        let runner = runner(
            gateway.clone(),
            ExperimentParams::default().with_method(MitigationMethod::Role),
        )
        .with_store(store.clone())
        .with_transcript(transcript.clone());

        let runs = runner
            .run_all(
                dataset(&["q1", "q2"]),
                &[Protocol::Raw, Protocol::WrongGuidance],
                &Model::default(),
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].protocol, Protocol::WrongGuidance);
        assert_eq!(runs[0].saved_to, Some(PathBuf::from("Wrong_Guidance.json")));
        assert_eq!(
            *store.saved.lock().unwrap(),
            vec![(MitigationMethod::Role, Protocol::WrongGuidance, 2)]
        );

        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts.iter().all(|p| p.contains("independent-minded expert")));

        let events = transcript.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| **e == "item_completed").count(), 2);
        assert_eq!(events.iter().filter(|e| **e == "protocol_finished").count(), 1);
    }

    #[tokio::test]
    async fn test_raw_never_augmented_or_voted() {
        let gateway = Arc::new(AnsweringGateway::new(&[("Q: Question q1?", reply("A"))]));
        let runner = runner(
            gateway.clone(),
            ExperimentParams::default()
                .with_method(MitigationMethod::SelfConsistency)
                .with_votes(4),
        );

        runner
            .run(dataset(&["q1"]), Protocol::Raw, &Model::default())
            .await
            .unwrap();
        assert_eq!(gateway.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_self_consistency_votes() {
        let gateway = Arc::new(AnsweringGateway::new(&[("Q: Question q1?", reply("B"))]));
        let runner = runner(
            gateway.clone(),
            ExperimentParams::default()
                .with_method(MitigationMethod::SelfConsistency)
                .with_votes(3),
        );

        let run = runner
            .run(dataset(&["q1"]), Protocol::CorrectGuidance, &Model::default())
            .await
            .unwrap();
        assert_eq!(gateway.prompts.lock().unwrap().len(), 3);
        assert_eq!(run.entries[0].model_answer, "B");
        assert_eq!(run.entries[0].raw_response.as_deref().unwrap().lines().count(), 3);
    }
}
