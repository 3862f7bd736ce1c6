//! Prompt assembly
//!
//! Builds the final instruction text in fixed order: system block, tag
//! refinements, worked examples, retrieved context with citation markers,
//! conversation tail, and the user query verbatim. Empty retrieval drops
//! the context block and switches to the no-context system variant.

use crate::classify::{Classification, SecondaryTag};
use crate::conversation::{ConversationTurn, Role};
use crate::prompts::examples::select_examples;
use crate::prompts::templates::{refinement_block, system_block, SYSTEM_NO_CONTEXT};
use crate::types::RetrievalResult;
use serde::{Deserialize, Serialize};

/// Prompt assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Most recent turns considered for the conversation tail
    pub max_history_turns: usize,
    /// Character budget for the conversation tail; whole turns are dropped
    /// oldest-first to fit, never truncated mid-turn
    pub history_char_budget: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
            history_char_budget: 4000,
        }
    }
}

/// Render a context chunk's citation marker, e.g. `[Source 2: guide.pdf, page 7]`
fn citation_marker(index: usize, document: &str, page: usize) -> String {
    format!("[Source {index}: {document}, page {page}]")
}

/// The marker fragment the finalizer scans answers for
pub fn marker_token(index: usize) -> String {
    format!("[Source {index}")
}

/// Prompt composer
#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    config: ComposerConfig,
}

impl PromptComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ComposerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Assemble the full prompt. The user query is always last and always
    /// verbatim.
    pub fn compose(
        &self,
        classification: &Classification,
        retrieval: &RetrievalResult,
        conversation_tail: &[ConversationTurn],
        query: &str,
    ) -> String {
        let mut sections: Vec<String> = Vec::new();

        // (a) system instruction block; no-context variant guards against
        // fabricated citations
        if retrieval.is_empty() {
            sections.push(SYSTEM_NO_CONTEXT.to_string());
        } else {
            sections.push(system_block(classification.category).to_string());
        }

        // (b) tag refinements, in tag order
        for tag in &classification.tags {
            sections.push(refinement_block(*tag).to_string());
        }

        // (c) worked examples
        let examples = select_examples(classification.category, &classification.tags);
        if !examples.is_empty() {
            let rendered: Vec<&str> = examples.iter().map(|e| e.text).collect();
            sections.push(format!(
                "Follow the shape of these examples:\n\n{}",
                rendered.join("\n\n")
            ));
        }

        // (d) retrieved context with citation markers; omitted when empty
        if !retrieval.is_empty() {
            let mut context = String::from(
                "Use the following sources to answer. Cite a source with its marker, \
                 e.g. [Source 1].\n",
            );
            for (i, hit) in retrieval.hits.iter().enumerate() {
                context.push_str(&format!(
                    "\n{}\n{}\n",
                    citation_marker(i + 1, &hit.document_name, hit.page),
                    hit.text
                ));
            }
            sections.push(context);
        }

        // (e) conversation tail
        let history = self.render_history(conversation_tail);
        if !history.is_empty() {
            sections.push(format!("Conversation so far:\n{history}"));
        }

        // (f) the user query, verbatim
        sections.push(format!("Question: {query}"));

        sections.join("\n\n")
    }

    /// Render the most recent turns within the character budget. Older
    /// turns are dropped whole; a turn is never cut mid-text.
    fn render_history(&self, tail: &[ConversationTurn]) -> String {
        let start = tail.len().saturating_sub(self.config.max_history_turns);
        let window = &tail[start..];

        let mut lines: Vec<String> = Vec::new();
        let mut used = 0usize;

        for turn in window.iter().rev() {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            let line = format!("{speaker}: {}", turn.content);

            if used + line.len() > self.config.history_char_budget && !lines.is_empty() {
                break;
            }
            if line.len() > self.config.history_char_budget {
                break;
            }

            used += line.len();
            lines.push(line);
        }

        lines.reverse();
        lines.join("\n")
    }
}
