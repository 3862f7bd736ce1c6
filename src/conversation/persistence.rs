//! JSON-file conversation store
//!
//! One file per conversation under a storage directory, named
//! `conversation_<id>.json`. Reads and writes go through `spawn_blocking`
//! so the async pipeline never blocks on disk I/O.

use crate::conversation::store::{ConversationStore, ConversationSummary};
use crate::conversation::{Conversation, ConversationTurn};
use crate::errors::{QaError, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

/// File-backed conversation store
#[derive(Debug, Clone)]
pub struct FileConversationStore {
    storage_dir: PathBuf,
}

impl FileConversationStore {
    /// Create a store rooted at `storage_dir`, creating the directory if
    /// it does not exist
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        if !storage_dir.exists() {
            fs::create_dir_all(&storage_dir)
                .context("Failed to create conversation storage directory")
                .map_err(QaError::from)?;
        }

        Ok(Self { storage_dir })
    }

    /// Default location under the user's home directory
    pub fn default_dir() -> Result<Self> {
        let dir = dirs::home_dir()
            .ok_or_else(|| QaError::Config("Could not determine home directory".to_string()))?
            .join(".askdocs")
            .join("conversations");

        Self::new(dir)
    }

    fn path_for(&self, conversation_id: &str) -> PathBuf {
        // Keep ids filesystem-safe
        let safe: String = conversation_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.storage_dir.join(format!("conversation_{safe}.json"))
    }

    fn read(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let path = self.path_for(conversation_id);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .context("Failed to read conversation file")
            .map_err(QaError::from)?;

        let conversation: Conversation = serde_json::from_str(&json)
            .context("Failed to deserialize conversation")
            .map_err(QaError::from)?;

        Ok(Some(conversation))
    }

    fn write(&self, conversation: &Conversation) -> Result<()> {
        let path = self.path_for(&conversation.id);

        let json = serde_json::to_string_pretty(conversation)
            .context("Failed to serialize conversation")
            .map_err(QaError::from)?;

        fs::write(&path, json)
            .context("Failed to write conversation file")
            .map_err(QaError::from)?;

        Ok(())
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn append_turn(&self, conversation_id: &str, turn: ConversationTurn) -> Result<()> {
        let store = self.clone();
        let id = conversation_id.to_string();

        tokio::task::spawn_blocking(move || {
            let mut conversation = store
                .read(&id)?
                .unwrap_or_else(|| Conversation::new(&id));
            conversation.push(turn);
            store.write(&conversation)
        })
        .await
        .map_err(|e| QaError::Store(format!("store task failed: {e}")))?
    }

    async fn load_tail(&self, conversation_id: &str, n: usize) -> Result<Vec<ConversationTurn>> {
        let store = self.clone();
        let id = conversation_id.to_string();

        tokio::task::spawn_blocking(move || {
            Ok(store
                .read(&id)?
                .map(|c| c.tail(n).to_vec())
                .unwrap_or_default())
        })
        .await
        .map_err(|e| QaError::Store(format!("store task failed: {e}")))?
    }

    async fn clear(&self, conversation_id: &str) -> Result<()> {
        let path = self.path_for(conversation_id);

        tokio::task::spawn_blocking(move || {
            if path.exists() {
                fs::remove_file(&path)
                    .context("Failed to delete conversation file")
                    .map_err(QaError::from)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| QaError::Store(format!("store task failed: {e}")))?
    }

    async fn list(&self) -> Result<Vec<ConversationSummary>> {
        let store = self.clone();

        tokio::task::spawn_blocking(move || {
            let mut summaries = Vec::new();

            for entry in fs::read_dir(&store.storage_dir).map_err(QaError::Io)? {
                let path = entry.map_err(QaError::Io)?.path();
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if !name.starts_with("conversation_") || !name.ends_with(".json") {
                    continue;
                }

                match fs::read_to_string(&path)
                    .map_err(QaError::Io)
                    .and_then(|json| {
                        serde_json::from_str::<Conversation>(&json).map_err(QaError::Serialization)
                    }) {
                    Ok(conversation) => summaries.push(ConversationSummary {
                        id: conversation.id.clone(),
                        preview: conversation.preview.clone(),
                        last_updated: conversation.last_updated,
                        turn_count: conversation.turns.len(),
                    }),
                    Err(e) => {
                        // A corrupt file should not hide the rest
                        tracing::warn!(file = %path.display(), error = %e, "skipping unreadable conversation");
                    }
                }
            }

            summaries.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
            Ok(summaries)
        })
        .await
        .map_err(|e| QaError::Store(format!("store task failed: {e}")))?
    }
}
