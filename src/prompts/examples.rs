//! Static worked-example bank
//!
//! Short question/answer pairs that show small local models the expected
//! response shape. Selection matches tags first, then the primary category,
//! and returns at most two examples.

use crate::classify::{PromptCategory, SecondaryTag};

/// One worked example with the categories and tags it illustrates
pub struct WorkedExample {
    pub name: &'static str,
    pub categories: &'static [PromptCategory],
    pub tags: &'static [SecondaryTag],
    pub text: &'static str,
}

pub static EXAMPLE_BANK: &[WorkedExample] = &[
    WorkedExample {
        name: "general",
        categories: &[PromptCategory::General, PromptCategory::Conversational],
        tags: &[],
        text: "\
Question: What is photosynthesis?
Answer: Photosynthesis is the process where plants convert sunlight, water, and carbon
dioxide into oxygen and glucose. It happens in chloroplasts containing chlorophyll, which
absorbs light energy. The glucose fuels the plant and the oxygen is released as a byproduct.",
    },
    WorkedExample {
        name: "technical",
        categories: &[PromptCategory::Document],
        tags: &[],
        text: "\
Question: How does a relational database store data?
Answer: A relational database stores data in tables of rows and columns. Each row is a
record and each column an attribute. Primary keys identify records uniquely, foreign keys
relate tables to each other, and SQL queries retrieve and manipulate the data.",
    },
    WorkedExample {
        name: "programming",
        categories: &[PromptCategory::Code],
        tags: &[],
        text: "\
Question: Why does my Python function return None?
Answer: A Python function returns None when it reaches the end of its body without an
explicit return statement. Check that every code path ends in `return <value>`; a common
mistake is returning inside a loop condition that never executes.",
    },
    WorkedExample {
        name: "step_by_step",
        categories: &[PromptCategory::Instructional],
        tags: &[SecondaryTag::StepByStep],
        text: "\
Question: How do I reset my password?
Answer:
1. Go to the login page
2. Click the \"Forgot Password\" link below the login form
3. Enter the email address on your account
4. Open the reset link from your inbox (links expire after 24 hours)
5. Enter the new password twice and submit
6. Log in with the new password",
    },
    WorkedExample {
        name: "comparison",
        categories: &[],
        tags: &[SecondaryTag::Comparison],
        text: "\
Question: What's the difference between RAM and ROM?
Answer:
RAM: volatile working memory for running programs; fast, writable, cleared on power off.
ROM: non-volatile storage for firmware; retains data without power, rarely written.
Use RAM capacity for multitasking performance; ROM matters for startup behavior.",
    },
    WorkedExample {
        name: "troubleshooting",
        categories: &[],
        tags: &[SecondaryTag::Troubleshooting],
        text: "\
Question: My printer is not printing, how do I fix it?
Answer: Likely causes, most common first:
1. Connection - confirm the printer is on the same network; print a test page
2. Queue stuck - clear the print queue and retry
3. Driver - reinstall the driver for your exact model
If the test page prints but documents do not, the problem is the application, not the printer.",
    },
];

/// Select one or two examples matching the classification.
///
/// Tag matches come first (in tag order), then category matches fill the
/// remaining slot. Selection is deterministic: bank order decides among
/// equal matches.
pub fn select_examples(
    category: PromptCategory,
    tags: &[SecondaryTag],
) -> Vec<&'static WorkedExample> {
    let mut selected: Vec<&'static WorkedExample> = Vec::new();

    for tag in tags {
        if selected.len() == 2 {
            break;
        }
        if let Some(example) = EXAMPLE_BANK
            .iter()
            .find(|e| e.tags.contains(tag) && !selected.iter().any(|s| s.name == e.name))
        {
            selected.push(example);
        }
    }

    if selected.len() < 2 {
        if let Some(example) = EXAMPLE_BANK
            .iter()
            .find(|e| e.categories.contains(&category) && !selected.iter().any(|s| s.name == e.name))
        {
            selected.push(example);
        }
    }

    // Always offer at least the general example
    if selected.is_empty() {
        selected.push(&EXAMPLE_BANK[0]);
    }

    selected
}
