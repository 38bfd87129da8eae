//! Inference client
//!
//! Wraps a [`CompletionGateway`] with the retry policy, reasoning-segment
//! stripping and self-consistency vote collection.

use crate::config::{InferenceParams, RetryState};
use crate::ports::completion_gateway::CompletionGateway;
use conformity_domain::{Conversation, Model, strip_reasoning};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Retrying completion client shared by every item task
pub struct InferenceClient<G: CompletionGateway + 'static> {
    gateway: Arc<G>,
    params: InferenceParams,
}

impl<G: CompletionGateway + 'static> InferenceClient<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            params: InferenceParams::default(),
        }
    }

    pub fn with_params(mut self, params: InferenceParams) -> Self {
        self.params = params;
        self
    }

    pub fn params(&self) -> &InferenceParams {
        &self.params
    }

    /// Complete `conversation`, returning `None` when retries are exhausted.
    ///
    /// With `votes > 1` the conversation is completed `votes` times, each with
    /// the full retry budget, and the successful replies are joined with
    /// newlines. `None` only if every vote failed.
    pub async fn complete(
        &self,
        conversation: &Conversation,
        model: &Model,
        votes: usize,
    ) -> Option<String> {
        if votes <= 1 {
            return self.complete_once(conversation, model).await;
        }

        let mut replies = Vec::with_capacity(votes);
        for vote in 1..=votes {
            match self.complete_once(conversation, model).await {
                Some(reply) => replies.push(reply),
                None => warn!("Vote {}/{} for {} produced no reply", vote, votes, model),
            }
        }

        if replies.is_empty() {
            None
        } else {
            Some(replies.join("\n"))
        }
    }

    /// One reply under the retry policy
    async fn complete_once(&self, conversation: &Conversation, model: &Model) -> Option<String> {
        let policy = &self.params.retry;
        let mut state = RetryState::default();

        loop {
            match self.gateway.complete(model, conversation).await {
                Ok(reply) => {
                    debug!(
                        model = %model,
                        attempts = state.attempt + 1,
                        "Completion succeeded"
                    );
                    return Some(self.post_process(model, &reply));
                }
                Err(e) => {
                    state.record_failure(&e);
                    warn!(
                        "Attempt {}/{} for {} failed: {}",
                        state.attempt, policy.max_attempts, model, e
                    );

                    match policy.next_delay(&state) {
                        Some(delay) => {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                        }
                        None => {
                            error!(
                                "Giving up on {} after {} attempts: {}",
                                model,
                                state.attempt,
                                state.last_error.as_deref().unwrap_or("unknown error")
                            );
                            return None;
                        }
                    }
                }
            }
        }
    }

    fn post_process(&self, model: &Model, reply: &str) -> String {
        let reasoning = &self.params.reasoning;
        if reasoning.applies_to(model) {
            strip_reasoning(reply, &reasoning.open_marker, &reasoning.close_marker)
                .trim()
                .to_string()
        } else {
            reply.trim().to_string()
        }
    }
}
