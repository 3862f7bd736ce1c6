//! Generation phase machine
//!
//! A request moves `Idle -> Composing -> Streaming -> Finalizing -> Idle`,
//! with `Streaming -> Failed -> Idle` on errors and `Streaming -> Cancelled
//! -> Idle` on caller cancellation. Composing failures skip the backend
//! entirely and go straight to `Failed`. Transitions are an explicit table;
//! anything else is rejected.

use crate::errors::{QaError, Result};
use serde::{Deserialize, Serialize};

/// Request lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationPhase {
    /// No request in flight
    Idle,

    /// Running classifier, retriever, and composer
    Composing,

    /// Relaying backend tokens to the caller
    Streaming,

    /// Assembling the answer, citations, and conversation turns
    Finalizing,

    /// Caller cancelled mid-stream; partial tokens are final
    Cancelled,

    /// Request failed; no assistant turn recorded
    Failed,
}

/// Events driving phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A new request was accepted
    RequestAccepted,

    /// Prompt assembled, backend call starting
    PromptReady,

    /// Classifier, retriever, or composer failed
    ComposeFailed,

    /// Backend delivered its end-of-stream marker
    StreamComplete,

    /// Backend failed mid-stream or timed out
    StreamFailed,

    /// Caller requested cancellation
    CancelRequested,

    /// Answer and turns recorded
    Finalized,

    /// Terminal outcome acknowledged, ready for the next request
    Acknowledged,
}

impl GenerationPhase {
    /// Whether a request outcome has been reached
    pub fn is_terminal_outcome(&self) -> bool {
        matches!(self, GenerationPhase::Cancelled | GenerationPhase::Failed)
    }

    /// Attempt a transition; invalid pairs are rejected with
    /// `QaError::InvalidTransition`.
    pub fn transition(&self, event: PhaseEvent) -> Result<GenerationPhase> {
        use GenerationPhase::*;
        use PhaseEvent::*;

        let next = match (self, event) {
            (Idle, RequestAccepted) => Composing,

            (Composing, PromptReady) => Streaming,
            (Composing, ComposeFailed) => Failed,

            (Streaming, StreamComplete) => Finalizing,
            (Streaming, StreamFailed) => Failed,
            (Streaming, CancelRequested) => Cancelled,

            (Finalizing, Finalized) => Idle,

            (Cancelled, Acknowledged) => Idle,
            (Failed, Acknowledged) => Idle,

            (from, event) => {
                return Err(QaError::InvalidTransition {
                    from: format!("{from:?}"),
                    to: format!("(via {event:?})"),
                    reason: format!("no transition from {from:?} on {event:?}"),
                });
            }
        };

        Ok(next)
    }
}
