//! Generation controller
//!
//! Drives one request through the phase machine: composes the prompt
//! (classify + retrieve + assemble), relays backend tokens to the caller
//! with cancellation checked between sends and a per-request deadline
//! enforced independently of the backend, then finalizes the answer,
//! citations, and conversation turns. Requests within one conversation are
//! serialized; distinct conversations run in parallel.

use crate::backend::{ModelBackend, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::classify::classify;
use crate::conversation::{ConversationLocks, ConversationStore, ConversationTurn};
use crate::errors::{QaError, Result};
use crate::generation::cancel::CancelHandle;
use crate::generation::events::StreamEvent;
use crate::generation::state::{GenerationPhase, PhaseEvent};
use crate::prompts::composer::{marker_token, PromptComposer};
use crate::retrieval::{sanitize_query, HybridRetriever};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{Citation, RetrievalResult};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Controller tuning parameters
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Deadline for the whole streaming phase
    pub stream_timeout: Duration,
    /// Bounded token-channel capacity
    pub channel_capacity: usize,
    /// Conversation turns loaded for the prompt tail
    pub history_turns: usize,
    /// Attempt bound for establishing the backend call
    pub max_attempts: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            stream_timeout: Duration::from_secs(120),
            channel_capacity: 32,
            history_turns: 10,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Handle returned to the caller for one streamed answer
pub struct StreamingAnswer {
    /// Token events followed by one terminal `Done`/`Error` event; the
    /// channel closes without a terminal event on cancellation
    pub events: mpsc::Receiver<StreamEvent>,
    /// Cooperative cancellation signal
    pub cancel: CancelHandle,
}

/// How the streaming phase ended
enum StreamOutcome {
    Complete,
    Cancelled,
    Failed(QaError),
}

/// Generation controller over the retrieval, prompt, and backend seams
pub struct GenerationController {
    retriever: Arc<HybridRetriever>,
    composer: PromptComposer,
    backend: Arc<dyn ModelBackend>,
    store: Arc<dyn ConversationStore>,
    locks: ConversationLocks,
    telemetry: TelemetryCollector,
    config: ControllerConfig,
}

impl GenerationController {
    pub fn new(
        retriever: Arc<HybridRetriever>,
        composer: PromptComposer,
        backend: Arc<dyn ModelBackend>,
        store: Arc<dyn ConversationStore>,
    ) -> Self {
        Self::with_config(
            retriever,
            composer,
            backend,
            store,
            ControllerConfig::default(),
        )
    }

    pub fn with_config(
        retriever: Arc<HybridRetriever>,
        composer: PromptComposer,
        backend: Arc<dyn ModelBackend>,
        store: Arc<dyn ConversationStore>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            retriever,
            composer,
            backend,
            store,
            locks: ConversationLocks::new(),
            telemetry: TelemetryCollector::new(),
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Start answering a query. Returns immediately with the event receiver
    /// and a cancellation handle; the request runs as its own task.
    pub fn stream_chat(self: &Arc<Self>, conversation_id: &str, query: &str) -> StreamingAnswer {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let cancel = CancelHandle::new();

        let controller = self.clone();
        let conversation_id = conversation_id.to_string();
        let query = query.to_string();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            controller
                .run_request(conversation_id, query, tx, task_cancel)
                .await;
        });

        StreamingAnswer { events: rx, cancel }
    }

    async fn run_request(
        self: Arc<Self>,
        conversation_id: String,
        query: String,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancelHandle,
    ) {
        // Second request for the same conversation queues here
        let _guard = self.locks.acquire(&conversation_id).await;
        let started = Instant::now();

        let query = sanitize_query(&query);
        let mut phase = self.advance(GenerationPhase::Idle, PhaseEvent::RequestAccepted);

        // Composing: classifier, retriever, composer; failure here never
        // contacts the backend
        let (prompt, retrieval) = match self.compose(&conversation_id, &query).await {
            Ok(composed) => composed,
            Err(e) => {
                phase = self.advance(phase, PhaseEvent::ComposeFailed);
                self.record_user_turn(&conversation_id, &query).await;
                self.emit_failure(&tx, &e).await;
                self.advance(phase, PhaseEvent::Acknowledged);
                return;
            }
        };
        phase = self.advance(phase, PhaseEvent::PromptReady);

        // Streaming
        let (outcome, answer, token_count) = self.relay_tokens(prompt, &tx, &cancel).await;

        match outcome {
            StreamOutcome::Complete => {
                phase = self.advance(phase, PhaseEvent::StreamComplete);

                let citations = extract_citations(&answer, &retrieval);
                self.record_user_turn(&conversation_id, &query).await;
                self.record_assistant_turn(&conversation_id, &answer, citations.clone())
                    .await;

                if tx.send(StreamEvent::Done { citations }).await.is_err() {
                    tracing::debug!("caller went away before the done event");
                }

                self.telemetry.record(TelemetryEvent::AnswerCompleted {
                    token_count,
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Instant::now(),
                });
                self.advance(phase, PhaseEvent::Finalized);
            }
            StreamOutcome::Cancelled => {
                phase = self.advance(phase, PhaseEvent::CancelRequested);

                // The question was asked; the partial answer is not recorded
                self.record_user_turn(&conversation_id, &query).await;
                self.telemetry.record(TelemetryEvent::RequestCancelled {
                    timestamp: Instant::now(),
                });
                self.advance(phase, PhaseEvent::Acknowledged);
            }
            StreamOutcome::Failed(e) => {
                phase = self.advance(phase, PhaseEvent::StreamFailed);

                self.record_user_turn(&conversation_id, &query).await;
                self.emit_failure(&tx, &e).await;
                self.advance(phase, PhaseEvent::Acknowledged);
            }
        }
    }

    /// Classify, retrieve, and assemble the prompt
    async fn compose(
        &self,
        conversation_id: &str,
        query: &str,
    ) -> Result<(String, RetrievalResult)> {
        if query.is_empty() {
            return Err(QaError::EmptyQuery);
        }

        let tail = self
            .store
            .load_tail(conversation_id, self.config.history_turns)
            .await?;

        let classification = classify(query, !tail.is_empty());
        tracing::debug!(category = ?classification.category, tags = ?classification.tags, "query classified");

        let retrieval = self.retriever.retrieve(query, Some(conversation_id)).await?;
        self.telemetry.record(TelemetryEvent::RetrievalCompleted {
            hits: retrieval.len(),
            generation: retrieval.generation,
            timestamp: Instant::now(),
        });

        let prompt = self.composer.compose(&classification, &retrieval, &tail, query);
        Ok((prompt, retrieval))
    }

    /// Relay backend tokens until completion, cancellation, deadline, or
    /// failure. Returns the concatenated answer, byte-for-byte equal to the
    /// delivered token sequence.
    async fn relay_tokens(
        &self,
        prompt: String,
        tx: &mpsc::Sender<StreamEvent>,
        cancel: &CancelHandle,
    ) -> (StreamOutcome, String, usize) {
        let retry = RetryPolicy::new(self.config.max_attempts);
        let backend = self.backend.clone();

        let mut stream = match retry
            .run(|| {
                let backend = backend.clone();
                let prompt = prompt.clone();
                async move { backend.generate_stream(prompt).await }
            })
            .await
        {
            Ok(stream) => stream,
            Err(e) => return (StreamOutcome::Failed(e), String::new(), 0),
        };

        let deadline = Instant::now() + self.config.stream_timeout;
        let mut answer = String::new();
        let mut token_count = 0usize;

        let outcome = loop {
            if cancel.is_cancelled() {
                break StreamOutcome::Cancelled;
            }

            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break StreamOutcome::Failed(QaError::BackendTimeout {
                    duration_ms: self.config.stream_timeout.as_millis() as u64,
                });
            };

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    break StreamOutcome::Cancelled;
                }

                next = tokio::time::timeout(remaining, stream.next()) => {
                    match next {
                        Err(_) => {
                            break StreamOutcome::Failed(QaError::BackendTimeout {
                                duration_ms: self.config.stream_timeout.as_millis() as u64,
                            });
                        }
                        Ok(None) => {
                            break StreamOutcome::Failed(QaError::Stream(
                                "backend stream ended without end-of-stream marker".to_string(),
                            ));
                        }
                        Ok(Some(Err(e))) => {
                            break StreamOutcome::Failed(e);
                        }
                        Ok(Some(Ok(chunk))) => {
                            if !chunk.text.is_empty() {
                                answer.push_str(&chunk.text);
                                token_count += 1;

                                if tx.send(StreamEvent::token(&chunk.text)).await.is_err() {
                                    // Receiver dropped: the client disconnected
                                    break StreamOutcome::Cancelled;
                                }
                                self.telemetry.record(TelemetryEvent::TokenRelayed {
                                    timestamp: Instant::now(),
                                });
                            }

                            if chunk.done {
                                break StreamOutcome::Complete;
                            }
                        }
                    }
                }
            }
        };

        // Dropping the stream abandons the backend call; its resources are
        // reclaimed even if the backend ignores cancellation.
        drop(stream);

        (outcome, answer, token_count)
    }

    fn advance(&self, phase: GenerationPhase, event: PhaseEvent) -> GenerationPhase {
        match phase.transition(event) {
            Ok(next) => {
                self.telemetry
                    .phase_transition(format!("{phase:?}"), format!("{next:?}"));
                next
            }
            Err(e) => {
                tracing::error!(error = %e, "phase machine rejected internal transition");
                phase
            }
        }
    }

    async fn record_user_turn(&self, conversation_id: &str, query: &str) {
        if query.is_empty() {
            return;
        }
        if let Err(e) = self
            .store
            .append_turn(conversation_id, ConversationTurn::user(query))
            .await
        {
            tracing::warn!(error = %e, "failed to persist user turn");
        }
    }

    async fn record_assistant_turn(
        &self,
        conversation_id: &str,
        answer: &str,
        citations: Vec<Citation>,
    ) {
        let citations = (!citations.is_empty()).then_some(citations);
        if let Err(e) = self
            .store
            .append_turn(
                conversation_id,
                ConversationTurn::assistant(answer, citations),
            )
            .await
        {
            tracing::warn!(error = %e, "failed to persist assistant turn");
        }
    }

    async fn emit_failure(&self, tx: &mpsc::Sender<StreamEvent>, error: &QaError) {
        tracing::warn!(error = %error, "request failed");
        self.telemetry.record(TelemetryEvent::RequestFailed {
            kind: format!("{error}"),
            timestamp: Instant::now(),
        });

        if tx.send(StreamEvent::error(error)).await.is_err() {
            tracing::debug!("caller went away before the error event");
        }
    }
}

/// Select the chunks actually cited by scanning the answer for surviving
/// `[Source N]` markers. No retrieval means no citations; markers that all
/// vanished mean every supplied chunk backed the answer.
fn extract_citations(answer: &str, retrieval: &RetrievalResult) -> Vec<Citation> {
    if retrieval.is_empty() {
        return Vec::new();
    }

    let all = Citation::from_hits(&retrieval.hits);
    let cited: Vec<Citation> = all
        .iter()
        .filter(|citation| answer.contains(&marker_token(citation.marker)))
        .cloned()
        .collect();

    if cited.is_empty() {
        all
    } else {
        cited
    }
}
