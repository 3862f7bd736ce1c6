//! Conversation turns and persistence seams
//!
//! A conversation is an ordered, append-only sequence of turns. The
//! pipeline owns a conversation only for the duration of one request and
//! persists turns through the `ConversationStore` trait at turn boundaries.

pub mod locks;
pub mod persistence;
pub mod store;

pub use locks::ConversationLocks;
pub use persistence::FileConversationStore;
pub use store::{ConversationStore, MemoryConversationStore};

use crate::types::Citation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum preview length stored alongside a conversation
const PREVIEW_LENGTH: usize = 50;

/// Speaker role for a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One utterance in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Source citations, present on assistant turns that used context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            citations: None,
        }
    }

    pub fn assistant(content: impl Into<String>, citations: Option<Vec<Citation>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            citations,
        }
    }
}

/// A stored conversation with its derived listing fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub turns: Vec<ConversationTurn>,
    /// Truncated latest user message, for listings
    pub preview: String,
    pub last_updated: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
            preview: String::new(),
            last_updated: Utc::now(),
        }
    }

    /// Append a turn, maintaining preview and last_updated
    pub fn push(&mut self, turn: ConversationTurn) {
        if turn.role == Role::User {
            self.preview = preview_of(&turn.content);
        }
        self.last_updated = turn.timestamp;
        self.turns.push(turn);
    }

    /// The most recent `n` turns, oldest first
    pub fn tail(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

fn preview_of(content: &str) -> String {
    if content.len() > PREVIEW_LENGTH {
        let cut = (0..=PREVIEW_LENGTH)
            .rev()
            .find(|i| content.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &content[..cut])
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_updates_preview_from_user_turns_only() {
        let mut conversation = Conversation::new("conv-1");
        conversation.push(ConversationTurn::user("short question"));
        assert_eq!(conversation.preview, "short question");

        conversation.push(ConversationTurn::assistant("a very long answer", None));
        assert_eq!(conversation.preview, "short question");
    }

    #[test]
    fn test_long_preview_truncated() {
        let mut conversation = Conversation::new("conv-1");
        conversation.push(ConversationTurn::user("x".repeat(80)));

        assert!(conversation.preview.ends_with("..."));
        assert_eq!(conversation.preview.len(), PREVIEW_LENGTH + 3);
    }

    #[test]
    fn test_tail_returns_most_recent_in_order() {
        let mut conversation = Conversation::new("conv-1");
        for i in 0..5 {
            conversation.push(ConversationTurn::user(format!("q{i}")));
        }

        let tail = conversation.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "q3");
        assert_eq!(tail[1].content, "q4");

        assert_eq!(conversation.tail(100).len(), 5);
    }

    #[test]
    fn test_timestamps_monotonically_nondecreasing() {
        let mut conversation = Conversation::new("conv-1");
        conversation.push(ConversationTurn::user("first"));
        conversation.push(ConversationTurn::assistant("second", None));

        assert!(conversation.turns[0].timestamp <= conversation.turns[1].timestamp);
    }
}
