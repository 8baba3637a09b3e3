//! Prompt construction for grounded answering and refusal.
//!
//! Both builders are pure functions of their inputs: no clock, no randomness,
//! no side effects. The grounded template carries the admitted passages
//! verbatim, best-first, separated by rules, followed by the question and the
//! grounding instruction block.

use crate::retrieval::RetrievedPassage;
use std::fmt::Write;

/// Separator between passages in the grounded context block.
const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Build the grounding prompt for an answerable question.
pub fn grounded_prompt(question: &str, passages: &[RetrievedPassage]) -> String {
    let mut context = String::new();
    for (i, passage) in passages.iter().enumerate() {
        if i > 0 {
            context.push_str(PASSAGE_SEPARATOR);
        }
        let title = if passage.metadata.title.is_empty() {
            "untitled"
        } else {
            &passage.metadata.title
        };
        // write! into a String cannot fail.
        let _ = write!(context, "[Source: {title}]\n{}", passage.text);
    }

    format!(
        "You are a helpful assistant for a software development team. Answer the \
         question using ONLY the provided context passages.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Instructions:\n\
         - Answer only from the provided content.\n\
         - If the content is insufficient to fully answer, say so explicitly.\n\
         - Never introduce facts that are absent from the passages.\n\
         - Mention which source supports your answer.\n\n\
         Answer:"
    )
}

/// Build the refusal prompt for a question with insufficient evidence.
///
/// The model is asked only to phrase the refusal; it is never asked to answer
/// the question from its own knowledge.
pub fn refusal_prompt(question: &str) -> String {
    format!(
        "A user asked the following question, but the team knowledge base \
         contains no relevant information:\n\n\
         Question: {question}\n\n\
         Reply with a brief message that states you cannot answer this from the \
         current knowledge base. Do not attempt to answer the question itself. \
         Suggest that the user rephrase the question, check other documentation, \
         or contact a team member who may know.\n\n\
         Reply:"
    )
}
