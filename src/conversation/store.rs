//! Conversation store trait and in-memory implementation

use crate::conversation::{Conversation, ConversationTurn};
use crate::errors::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Summary row for conversation listings, newest first
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub id: String,
    pub preview: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
    pub turn_count: usize,
}

/// Persistence seam for conversations. Durability is the implementation's
/// responsibility; the pipeline only appends at turn boundaries and reads
/// bounded tails.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one turn, creating the conversation if needed
    async fn append_turn(&self, conversation_id: &str, turn: ConversationTurn) -> Result<()>;

    /// The most recent `n` turns, oldest first; unknown id yields empty
    async fn load_tail(&self, conversation_id: &str, n: usize) -> Result<Vec<ConversationTurn>>;

    /// Remove all turns of a conversation (explicit clear operation)
    async fn clear(&self, conversation_id: &str) -> Result<()>;

    /// List stored conversations, newest first
    async fn list(&self) -> Result<Vec<ConversationSummary>>;
}

/// In-memory store, used by tests and short-lived embedders
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    conversations: Mutex<HashMap<String, Conversation>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn append_turn(&self, conversation_id: &str, turn: ConversationTurn) -> Result<()> {
        let mut conversations = self
            .conversations
            .lock()
            .unwrap_or_else(|p| p.into_inner());

        conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| Conversation::new(conversation_id))
            .push(turn);

        Ok(())
    }

    async fn load_tail(&self, conversation_id: &str, n: usize) -> Result<Vec<ConversationTurn>> {
        let conversations = self
            .conversations
            .lock()
            .unwrap_or_else(|p| p.into_inner());

        Ok(conversations
            .get(conversation_id)
            .map(|c| c.tail(n).to_vec())
            .unwrap_or_default())
    }

    async fn clear(&self, conversation_id: &str) -> Result<()> {
        let mut conversations = self
            .conversations
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        conversations.remove(conversation_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>> {
        let conversations = self
            .conversations
            .lock()
            .unwrap_or_else(|p| p.into_inner());

        let mut summaries: Vec<ConversationSummary> = conversations
            .values()
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                preview: c.preview.clone(),
                last_updated: c.last_updated,
                turn_count: c.turns.len(),
            })
            .collect();

        summaries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_tail() {
        let store = MemoryConversationStore::new();

        store
            .append_turn("conv", ConversationTurn::user("first"))
            .await
            .unwrap();
        store
            .append_turn("conv", ConversationTurn::assistant("second", None))
            .await
            .unwrap();

        let tail = store.load_tail("conv", 10).await.unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].content, "first");
        assert_eq!(tail[1].content, "second");
    }

    #[tokio::test]
    async fn test_tail_bounded() {
        let store = MemoryConversationStore::new();
        for i in 0..6 {
            store
                .append_turn("conv", ConversationTurn::user(format!("q{i}")))
                .await
                .unwrap();
        }

        let tail = store.load_tail("conv", 3).await.unwrap();
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].content, "q3");
    }

    #[tokio::test]
    async fn test_unknown_conversation_yields_empty_tail() {
        let store = MemoryConversationStore::new();
        assert!(store.load_tail("missing", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_turns() {
        let store = MemoryConversationStore::new();
        store
            .append_turn("conv", ConversationTurn::user("q"))
            .await
            .unwrap();

        store.clear("conv").await.unwrap();
        assert!(store.load_tail("conv", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryConversationStore::new();
        store
            .append_turn("older", ConversationTurn::user("first question"))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .append_turn("newer", ConversationTurn::user("second question"))
            .await
            .unwrap();

        let listing = store.list().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].id, "newer");
        assert_eq!(listing[0].preview, "second question");
    }
}
