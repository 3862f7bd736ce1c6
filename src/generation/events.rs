//! Streaming events delivered to the caller
//!
//! A request yields zero or more `Token` events followed by exactly one
//! terminal event: `Done` with the citation list on success, or `Error`
//! with a structured kind on failure. Cancellation produces no terminal
//! event; the channel simply closes and tokens already delivered stand.

use crate::errors::QaError;
use crate::types::Citation;
use serde::{Deserialize, Serialize};

/// One event in a streamed answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// One token fragment, in backend production order
    Token { token: String },

    /// Terminal success event with the chunks actually cited
    Done { citations: Vec<Citation> },

    /// Terminal failure event; enough structure to decide retry vs abort
    Error { kind: String, message: String },
}

impl StreamEvent {
    pub fn token(text: impl Into<String>) -> Self {
        StreamEvent::Token { token: text.into() }
    }

    /// Build the failure event for an error
    pub fn error(err: &QaError) -> Self {
        StreamEvent::Error {
            kind: error_kind(err).to_string(),
            message: err.to_string(),
        }
    }
}

/// Stable machine-readable failure kind
fn error_kind(err: &QaError) -> &'static str {
    match err {
        QaError::DimensionMismatch { .. } => "dimension_mismatch",
        QaError::IndexUnavailable(_) => "index_unavailable",
        QaError::BackendUnreachable(_) => "backend_unreachable",
        QaError::BackendTimeout { .. } => "backend_timeout",
        QaError::Cancelled => "cancelled",
        QaError::InvalidTransition { .. } => "invalid_transition",
        QaError::EmptyQuery => "empty_query",
        QaError::Stream(_) => "stream",
        QaError::Http(_) => "http",
        QaError::Serialization(_) => "serialization",
        QaError::Io(_) => "io",
        QaError::Config(_) => "config",
        QaError::Store(_) => "store",
        QaError::Generic(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_event_carries_kind_and_message() {
        let err = QaError::BackendTimeout { duration_ms: 30000 };
        let event = StreamEvent::error(&err);

        match event {
            StreamEvent::Error { kind, message } => {
                assert_eq!(kind, "backend_timeout");
                assert!(message.contains("30000"));
            }
            _ => panic!("expected error event"),
        }
    }

    #[test]
    fn test_event_serialization_shape() {
        let token = serde_json::to_value(StreamEvent::token("Hi")).unwrap();
        assert_eq!(token["type"], "token");
        assert_eq!(token["token"], "Hi");

        let done = serde_json::to_value(StreamEvent::Done { citations: vec![] }).unwrap();
        assert_eq!(done["type"], "done");
    }
}
