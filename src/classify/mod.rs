//! Rule-based query classification
//!
//! A pure function from (query text, has conversation history) to a primary
//! prompt category plus secondary tags. Rules are an ordered table of
//! (category, predicate) pairs evaluated in fixed precedence order:
//! conversational > code > document > instructional > general. Tags
//! accumulate independently of the primary category.

use serde::{Deserialize, Serialize};

/// Primary prompt category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptCategory {
    General,
    Code,
    Document,
    Instructional,
    Conversational,
}

/// Secondary query tags; any number may apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryTag {
    Comparison,
    Troubleshooting,
    StepByStep,
    Clarification,
    FollowUp,
    MultiQuestion,
}

/// Classification output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: PromptCategory,
    /// Tags in declaration order, each at most once
    pub tags: Vec<SecondaryTag>,
}

/// Programming-language names and API/library terms
const CODE_TERMS: &[&str] = &[
    "code", "function", "programming", "algorithm", "compile", "compiler", "runtime", "syntax",
    "class", "method", "variable", "library", "framework", "api", "sdk", "dependency", "python",
    "java", "javascript", "typescript", "rust", "ruby", "php", "html", "css", "sql", "golang",
    "cpp", "csharp", "docker", "kubernetes", "git", "github", "npm", "pip", "cargo", "database",
];

/// References to manuals, specifications, and written material
const DOCUMENT_TERMS: &[&str] = &[
    "document", "documentation", "manual", "pdf", "book", "reference", "specification",
    "chapter", "section", "appendix", "report", "paper", "publication", "article",
];

const INSTRUCTIONAL_PHRASES: &[&str] = &[
    "how to", "how do", "how can", "how would", "how should", "step", "steps", "guide",
    "tutorial", "walkthrough", "teach", "learn", "explain", "instructions", "procedure",
];

/// Back-references to earlier turns; only meaningful with history present
const BACK_REFERENCE_PHRASES: &[&str] = &[
    "as i said", "as i mentioned", "earlier", "previous", "previously", "you said",
    "you mentioned", "what about", "follow up", "on that note", "about that", "continuing",
];

const COMPARISON_TERMS: &[&str] = &[
    "vs", "versus", "compare", "comparison", "difference", "differences", "similarities",
    "pros", "cons", "advantages", "disadvantages", "tradeoffs", "alternative", "better",
];

const TROUBLESHOOTING_TERMS: &[&str] = &[
    "error", "errors", "fails", "failing", "failed", "broken", "fix", "issue", "problem",
    "debug", "troubleshoot", "stuck", "crash", "crashes", "not working",
];

const STEP_BY_STEP_PHRASES: &[&str] = &[
    "step", "steps", "step by step", "how to", "walkthrough", "setup", "install",
    "configure", "build", "create", "procedure", "instructions",
];

const CLARIFICATION_PHRASES: &[&str] = &[
    "clarify", "clarification", "what do you mean", "confused", "understand", "meant",
];

const FOLLOW_UP_PHRASES: &[&str] = &["follow up", "continue", "elaborate", "more on", "also"];

/// Facts extracted once per query so every rule matches against the same
/// normalized view
struct QueryFacts {
    /// Lowercased text with punctuation mapped to spaces, padded so phrase
    /// matching respects word boundaries
    padded: String,
    question_marks: usize,
    has_semicolon: bool,
    has_history: bool,
}

impl QueryFacts {
    fn from(query: &str, has_history: bool) -> Self {
        let normalized: String = query
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let collapsed = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        Self {
            padded: format!(" {collapsed} "),
            question_marks: query.matches('?').count(),
            has_semicolon: query.contains(';'),
            has_history,
        }
    }

    fn has_any(&self, terms: &[&str]) -> bool {
        terms
            .iter()
            .any(|term| self.padded.contains(&format!(" {term} ")))
    }
}

/// Ordered primary-category rule table; the first matching row wins
static PRIMARY_RULES: &[(PromptCategory, fn(&QueryFacts) -> bool)] = &[
    (PromptCategory::Conversational, |f| {
        f.has_history && f.has_any(BACK_REFERENCE_PHRASES)
    }),
    (PromptCategory::Code, |f| f.has_any(CODE_TERMS)),
    (PromptCategory::Document, |f| f.has_any(DOCUMENT_TERMS)),
    (PromptCategory::Instructional, |f| {
        f.has_any(INSTRUCTIONAL_PHRASES)
    }),
];

/// Secondary-tag rule table; every matching row applies
static TAG_RULES: &[(SecondaryTag, fn(&QueryFacts) -> bool)] = &[
    (SecondaryTag::Comparison, |f| f.has_any(COMPARISON_TERMS)),
    (SecondaryTag::Troubleshooting, |f| {
        f.has_any(TROUBLESHOOTING_TERMS)
    }),
    (SecondaryTag::StepByStep, |f| f.has_any(STEP_BY_STEP_PHRASES)),
    (SecondaryTag::Clarification, |f| {
        f.has_any(CLARIFICATION_PHRASES)
    }),
    (SecondaryTag::FollowUp, |f| {
        f.has_history && f.has_any(FOLLOW_UP_PHRASES)
    }),
    (SecondaryTag::MultiQuestion, |f| {
        f.question_marks > 1 || f.has_semicolon || f.has_any(&["and also"])
    }),
];

/// Classify a query. Deterministic and side-effect free: identical inputs
/// always produce the identical classification.
pub fn classify(query: &str, has_history: bool) -> Classification {
    let facts = QueryFacts::from(query, has_history);

    let category = PRIMARY_RULES
        .iter()
        .find(|(_, predicate)| predicate(&facts))
        .map(|(category, _)| *category)
        .unwrap_or(PromptCategory::General);

    let tags = TAG_RULES
        .iter()
        .filter(|(_, predicate)| predicate(&facts))
        .map(|(tag, _)| *tag)
        .collect();

    Classification { category, tags }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_pointer_query_is_instructional_with_troubleshooting() {
        let result = classify("how do I fix a null pointer error in C++", false);

        assert_eq!(result.category, PromptCategory::Instructional);
        assert!(result.tags.contains(&SecondaryTag::Troubleshooting));
    }

    #[test]
    fn test_code_query() {
        let result = classify("what does this python function return", false);
        assert_eq!(result.category, PromptCategory::Code);
    }

    #[test]
    fn test_document_query() {
        let result = classify("summarize chapter 3 of the installation manual", false);
        assert_eq!(result.category, PromptCategory::Document);
    }

    #[test]
    fn test_general_fallback() {
        let result = classify("what is the capital of France", false);
        assert_eq!(result.category, PromptCategory::General);
        assert!(result.tags.is_empty());
    }

    #[test]
    fn test_conversational_requires_history() {
        let query = "as I said earlier, what about the second option?";

        let without = classify(query, false);
        assert_ne!(without.category, PromptCategory::Conversational);

        let with = classify(query, true);
        assert_eq!(with.category, PromptCategory::Conversational);
    }

    #[test]
    fn test_conversational_outranks_code() {
        let result = classify("earlier you mentioned a python fix, which file was it?", true);
        assert_eq!(result.category, PromptCategory::Conversational);
    }

    #[test]
    fn test_code_outranks_document() {
        let result = classify("where does the api reference document the retry library", false);
        assert_eq!(result.category, PromptCategory::Code);
    }

    #[test]
    fn test_comparison_tag_regardless_of_category() {
        let result = classify("python vs rust for web servers", false);
        assert_eq!(result.category, PromptCategory::Code);
        assert!(result.tags.contains(&SecondaryTag::Comparison));
    }

    #[test]
    fn test_multi_question_detection() {
        let result = classify("what is DNS? and also how do I configure it?", false);
        assert!(result.tags.contains(&SecondaryTag::MultiQuestion));

        let single = classify("what is DNS?", false);
        assert!(!single.tags.contains(&SecondaryTag::MultiQuestion));
    }

    #[test]
    fn test_follow_up_tag_requires_history() {
        let query = "can you elaborate on the second point";
        assert!(!classify(query, false)
            .tags
            .contains(&SecondaryTag::FollowUp));
        assert!(classify(query, true).tags.contains(&SecondaryTag::FollowUp));
    }

    #[test]
    fn test_step_by_step_tag() {
        let result = classify("walk me through the setup steps", false);
        assert!(result.tags.contains(&SecondaryTag::StepByStep));
    }

    #[test]
    fn test_deterministic() {
        let a = classify("how do I install docker? it fails with an error", true);
        let b = classify("how do I install docker? it fails with an error", true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_punctuation_does_not_block_matching() {
        let result = classify("Compare: python, rust!", false);
        assert!(result.tags.contains(&SecondaryTag::Comparison));
        assert_eq!(result.category, PromptCategory::Code);
    }

    #[test]
    fn test_tags_have_no_duplicates() {
        let result = classify("error error error fix fails broken", false);
        let troubleshooting = result
            .tags
            .iter()
            .filter(|t| **t == SecondaryTag::Troubleshooting)
            .count();
        assert_eq!(troubleshooting, 1);
    }
}
