//! System instruction blocks and tag refinements
//!
//! One system block per prompt category, a no-context variant used when
//! retrieval comes back empty, and one refinement block per secondary tag.

use crate::classify::{PromptCategory, SecondaryTag};

pub const SYSTEM_GENERAL: &str = "\
You are a helpful assistant answering questions over the user's document collection.
When answering:
1. Be clear and concise
2. Ground every claim in the provided sources and cite them
3. Acknowledge limitations when the sources do not cover the question
4. Use a friendly, professional tone";

pub const SYSTEM_CODE: &str = "\
You are a technical assistant answering programming questions over the user's document collection.
When answering:
1. Explain concepts precisely and include code examples where helpful
2. Name the language, library, or API version when it matters
3. Ground answers in the provided sources and cite them
4. Point out pitfalls and common mistakes";

pub const SYSTEM_DOCUMENT: &str = "\
You are an assistant answering questions about specific documents.
When answering:
1. Answer strictly from the provided document excerpts
2. Cite the source document and page for every claim
3. Quote short passages where exact wording matters
4. Say clearly when the excerpts do not contain the answer";

pub const SYSTEM_INSTRUCTIONAL: &str = "\
You are an assistant providing step-by-step guidance grounded in the user's documents.
When answering:
1. Break the task into numbered, ordered steps
2. State prerequisites before the first step
3. Ground steps in the provided sources and cite them
4. Mention how to verify the task succeeded";

pub const SYSTEM_CONVERSATIONAL: &str = "\
You are an assistant continuing an ongoing conversation about the user's documents.
When answering:
1. Take the earlier turns below into account and stay consistent with them
2. Resolve references like \"that\" or \"the second option\" against the conversation
3. Ground new claims in the provided sources and cite them
4. Ask for clarification only when the conversation truly does not disambiguate";

/// Variant used when retrieval found no matching context. Prevents
/// fabricated citations: the model must say it is answering from general
/// knowledge.
pub const SYSTEM_NO_CONTEXT: &str = "\
You are a helpful assistant. No matching context was found in the user's document collection
for this question. Answer from general knowledge, and say so explicitly at the start of your
answer. Do not invent citations or refer to any document.";

pub const REFINE_COMPARISON: &str = "\
The question asks for a comparison. Present both options fairly, organize the answer by
criteria, and finish with a short recommendation including when each option is preferable.";

pub const REFINE_TROUBLESHOOTING: &str = "\
The question describes a problem to fix. Diagnose before prescribing:
1. Restate the symptom and likely causes, most probable first
2. Give diagnostic steps to confirm each cause
3. Give the fix for each confirmed cause
4. Mention how to prevent the problem from recurring";

pub const REFINE_STEP_BY_STEP: &str = "\
The user wants a procedure. Number every step, keep one action per step, and note
expected output after steps where the user can check progress.";

pub const REFINE_CLARIFICATION: &str = "\
The user is asking to clarify something already discussed. Restate the point in
different words before expanding on it, and keep the original claim and the
clarification clearly connected.";

pub const REFINE_FOLLOW_UP: &str = "\
This is a follow-up. Do not repeat the previous answer; build on it and reference
the relevant part of the conversation briefly.";

pub const REFINE_MULTI_QUESTION: &str = "\
The message contains multiple questions. Answer each one under its own short
heading, in the order asked, and do not merge or skip any of them.";

/// System block for a category
pub fn system_block(category: PromptCategory) -> &'static str {
    match category {
        PromptCategory::General => SYSTEM_GENERAL,
        PromptCategory::Code => SYSTEM_CODE,
        PromptCategory::Document => SYSTEM_DOCUMENT,
        PromptCategory::Instructional => SYSTEM_INSTRUCTIONAL,
        PromptCategory::Conversational => SYSTEM_CONVERSATIONAL,
    }
}

/// Refinement block for a secondary tag
pub fn refinement_block(tag: SecondaryTag) -> &'static str {
    match tag {
        SecondaryTag::Comparison => REFINE_COMPARISON,
        SecondaryTag::Troubleshooting => REFINE_TROUBLESHOOTING,
        SecondaryTag::StepByStep => REFINE_STEP_BY_STEP,
        SecondaryTag::Clarification => REFINE_CLARIFICATION,
        SecondaryTag::FollowUp => REFINE_FOLLOW_UP,
        SecondaryTag::MultiQuestion => REFINE_MULTI_QUESTION,
    }
}
