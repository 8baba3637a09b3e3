//! Answer verification — an independent check that a produced answer is
//! entailed by its cited sources.
//!
//! Verification runs after generation and independently of the gate's
//! admission decision; it exists to catch a generator that ignored the
//! grounding instructions. The judgment sees only the answer and its cited
//! sources, never the full retrieval corpus.
//!
//! Two implementations:
//! - [`JudgeVerifier`] — a second model invocation parsing a VALID/INVALID
//!   verdict; anything unparseable demotes to `Invalid`.
//! - [`LexicalVerifier`] — a deterministic content-term overlap check used in
//!   tests and as an offline fallback.

use crate::error::GenerationError;
use crate::generate::AnswerGenerator;
use crate::retrieval::RetrievedPassage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;

/// The verifier's judgment on a single answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Every claim in the answer is supported by the cited sources.
    Valid,
    /// At least one claim lacks support; the answer is demoted, not discarded.
    Invalid,
}

/// Contract for answer verification.
#[async_trait]
pub trait AnswerVerifier: Send + Sync {
    async fn verify(
        &self,
        question: &str,
        answer: &str,
        sources: &[RetrievedPassage],
    ) -> Result<Verdict, GenerationError>;
}

/// Verifier backed by a second model invocation.
pub struct JudgeVerifier {
    judge: Arc<dyn AnswerGenerator>,
}

impl JudgeVerifier {
    pub fn new(judge: Arc<dyn AnswerGenerator>) -> Self {
        Self { judge }
    }

    fn judgment_prompt(question: &str, answer: &str, sources: &[RetrievedPassage]) -> String {
        let source_block = sources
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        format!(
            "You are verifying whether an answer is fully supported by its cited \
             sources. Reply with exactly one word: VALID if every factual claim in \
             the answer appears in the sources, INVALID otherwise.\n\n\
             Question: {question}\n\n\
             Answer: {answer}\n\n\
             Sources:\n{source_block}\n\n\
             Verdict:"
        )
    }

    /// Parse the judge's reply. Only an unambiguous VALID counts as valid;
    /// everything else, including noise around the word INVALID, demotes.
    fn parse_verdict(reply: &str) -> Verdict {
        let upper = reply.trim().to_uppercase();
        // "INVALID" contains "VALID" as a substring; check it first.
        if upper.contains("INVALID") {
            Verdict::Invalid
        } else if upper.contains("VALID") {
            Verdict::Valid
        } else {
            warn!(reply_len = reply.len(), "unparseable verifier reply, demoting");
            Verdict::Invalid
        }
    }
}

#[async_trait]
impl AnswerVerifier for JudgeVerifier {
    async fn verify(
        &self,
        question: &str,
        answer: &str,
        sources: &[RetrievedPassage],
    ) -> Result<Verdict, GenerationError> {
        let prompt = Self::judgment_prompt(question, answer, sources);
        let reply = self.judge.generate(&prompt).await?;
        Ok(Self::parse_verdict(&reply))
    }
}

/// Deterministic rule-based entailment proxy.
///
/// Splits the answer into sentence claims and requires each claim's content
/// terms to overlap the source text by at least `overlap_floor`. Identical
/// input always yields the identical verdict.
pub struct LexicalVerifier {
    overlap_floor: f64,
}

impl LexicalVerifier {
    pub fn new(overlap_floor: f64) -> Self {
        Self { overlap_floor }
    }

    /// Words that carry no entailment signal.
    fn is_content_term(word: &str) -> bool {
        word.len() > 3
            && !matches!(
                word,
                "that" | "with" | "from" | "this" | "have" | "does" | "which" | "there"
                    | "their" | "about" | "would" | "should" | "could" | "been" | "were"
            )
    }

    fn content_terms(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| Self::is_content_term(w))
            .map(str::to_string)
            .collect()
    }

    fn claim_supported(claim: &str, source_terms: &HashSet<String>) -> bool {
        let terms = Self::content_terms(claim);
        if terms.is_empty() {
            // A claim with no content terms asserts nothing.
            return true;
        }
        let hits = terms.iter().filter(|t| source_terms.contains(*t)).count();
        hits as f64 / terms.len() as f64 > 0.0
    }

    fn check(&self, answer: &str, sources: &[RetrievedPassage]) -> Verdict {
        let source_terms: HashSet<String> = sources
            .iter()
            .flat_map(|p| Self::content_terms(&p.text))
            .collect();

        let claims: Vec<&str> = answer
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if claims.is_empty() {
            return Verdict::Invalid;
        }

        let terms: Vec<String> = Self::content_terms(answer);
        if terms.is_empty() {
            return Verdict::Invalid;
        }
        let hits = terms.iter().filter(|t| source_terms.contains(*t)).count();
        let overlap = hits as f64 / terms.len() as f64;

        let all_claims_touch_sources = claims
            .iter()
            .all(|c| Self::claim_supported(c, &source_terms));

        if overlap >= self.overlap_floor && all_claims_touch_sources {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

#[async_trait]
impl AnswerVerifier for LexicalVerifier {
    async fn verify(
        &self,
        _question: &str,
        answer: &str,
        sources: &[RetrievedPassage],
    ) -> Result<Verdict, GenerationError> {
        Ok(self.check(answer, sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::PassageMetadata;
    use pretty_assertions::assert_eq;

    fn source(text: &str) -> RetrievedPassage {
        RetrievedPassage {
            text: text.to_string(),
            distance: 0.1,
            metadata: PassageMetadata::default(),
        }
    }

    #[test]
    fn verdict_parse_prefers_invalid_over_substring_valid() {
        assert_eq!(JudgeVerifier::parse_verdict("INVALID"), Verdict::Invalid);
        assert_eq!(JudgeVerifier::parse_verdict("VALID"), Verdict::Valid);
        assert_eq!(
            JudgeVerifier::parse_verdict("The verdict is: invalid."),
            Verdict::Invalid
        );
        assert_eq!(
            JudgeVerifier::parse_verdict("valid, all claims supported"),
            Verdict::Valid
        );
    }

    #[test]
    fn unparseable_reply_demotes() {
        assert_eq!(
            JudgeVerifier::parse_verdict("I am not sure about this one"),
            Verdict::Invalid
        );
        assert_eq!(JudgeVerifier::parse_verdict(""), Verdict::Invalid);
    }

    #[test]
    fn judgment_prompt_carries_only_answer_and_cited_sources() {
        let prompt = JudgeVerifier::judgment_prompt(
            "q?",
            "the answer",
            &[source("cited passage one"), source("cited passage two")],
        );
        assert!(prompt.contains("cited passage one"));
        assert!(prompt.contains("cited passage two"));
        assert!(prompt.contains("the answer"));
    }

    #[tokio::test]
    async fn supported_answer_is_valid() {
        let verifier = LexicalVerifier::new(0.3);
        let sources = [source(
            "The Order-Processor Service consumes from the new-orders Kafka topic \
             and runs with 3 replicas in production.",
        )];
        let verdict = verifier
            .verify("q", "The service consumes from the new-orders Kafka topic.", &sources)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Valid);
    }

    #[tokio::test]
    async fn fabricated_answer_is_invalid() {
        let verifier = LexicalVerifier::new(0.3);
        let sources = [source("The deployment uses Kubernetes with 3 replicas.")];
        let verdict = verifier
            .verify(
                "q",
                "Payments settle through the Stripe gateway nightly via cron.",
                &sources,
            )
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Invalid);
    }

    #[tokio::test]
    async fn identical_input_yields_identical_verdict() {
        let verifier = LexicalVerifier::new(0.3);
        let sources = [source("Spring Boot 2.7 with Java 17 on the notification service.")];
        let first = verifier
            .verify("q", "The service runs Spring Boot 2.7 on Java 17.", &sources)
            .await
            .unwrap();
        for _ in 0..5 {
            let again = verifier
                .verify("q", "The service runs Spring Boot 2.7 on Java 17.", &sources)
                .await
                .unwrap();
            assert_eq!(first, again);
        }
    }

    #[tokio::test]
    async fn empty_answer_is_invalid() {
        let verifier = LexicalVerifier::new(0.3);
        let verdict = verifier.verify("q", "", &[source("anything")]).await.unwrap();
        assert_eq!(verdict, Verdict::Invalid);
    }
}
