//! User-facing answer records and their assembly.
//!
//! The assembler is pure aggregation, but it owns one invariant: an answer
//! with confidence `High` or `Low` must carry at least one source attribution.
//! Violating that is a pipeline defect, surfaced as [`AssemblyError`], never
//! shipped as an empty-source record.

use crate::error::AssemblyError;
use crate::gate::GateDecision;
use crate::retrieval::PassageMetadata;
use crate::verify::Verdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence label attached to every answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLabel {
    /// Gate admitted, verifier confirmed entailment.
    High,
    /// Gate admitted, but the verifier could not confirm entailment.
    Low,
    /// Gate refused; the answer is a refusal, not a factual claim.
    NoContext,
}

impl std::fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLabel::High => write!(f, "high"),
            ConfidenceLabel::Low => write!(f, "low"),
            ConfidenceLabel::NoContext => write!(f, "no_context"),
        }
    }
}

/// The assembled result of one question, immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub confidence: ConfidenceLabel,
    /// Source attributions, best-first. Non-empty whenever `confidence` is
    /// `High` or `Low`.
    pub sources: Vec<PassageMetadata>,
    /// Whether the verifier confirmed entailment.
    pub verified: bool,
    pub answered_at: DateTime<Utc>,
}

impl AnswerRecord {
    /// Render the answer for the chat boundary: the text itself, plus a
    /// confidence/sources footer whenever confidence is not `High`.
    pub fn render(&self) -> String {
        match self.confidence {
            ConfidenceLabel::High => self.answer.clone(),
            ConfidenceLabel::Low => {
                let sources = self
                    .sources
                    .iter()
                    .map(|s| s.title.as_str())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "{}\n\n(Low confidence: this answer could not be fully verified \
                     against its sources: {sources})",
                    self.answer
                )
            }
            ConfidenceLabel::NoContext => self.answer.clone(),
        }
    }
}

/// Builds [`AnswerRecord`]s, enforcing the source-attribution invariant.
pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Assemble a grounded answer from the gate's admitted passages and the
    /// verifier's verdict.
    pub fn assemble(
        question: &str,
        answer: String,
        decision: &GateDecision,
        verdict: Verdict,
    ) -> Result<AnswerRecord, AssemblyError> {
        let confidence = match verdict {
            Verdict::Valid => ConfidenceLabel::High,
            Verdict::Invalid => ConfidenceLabel::Low,
        };
        let sources: Vec<PassageMetadata> = decision
            .passages
            .iter()
            .map(|p| p.metadata.clone())
            .collect();
        if sources.is_empty() {
            return Err(AssemblyError::MissingSources {
                label: confidence.to_string(),
            });
        }
        Ok(AnswerRecord {
            question: question.to_string(),
            answer,
            confidence,
            sources,
            verified: verdict == Verdict::Valid,
            answered_at: Utc::now(),
        })
    }

    /// Assemble a refusal record. Carries no sources by construction.
    pub fn refusal(question: &str, answer: String) -> AnswerRecord {
        AnswerRecord {
            question: question.to_string(),
            answer,
            confidence: ConfidenceLabel::NoContext,
            sources: Vec::new(),
            verified: false,
            answered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GateStatus, GateDecision};
    use crate::retrieval::RetrievedPassage;
    use pretty_assertions::assert_eq;

    fn answerable_decision() -> GateDecision {
        GateDecision {
            status: GateStatus::Answerable,
            passages: vec![RetrievedPassage {
                text: "text".to_string(),
                distance: 0.1,
                metadata: PassageMetadata {
                    source_id: "42".to_string(),
                    title: "Order-Processor Service".to_string(),
                    url: None,
                    last_modified: None,
                },
            }],
            reason: "evidence sufficient".to_string(),
        }
    }

    #[test]
    fn valid_verdict_yields_high_confidence() {
        let record = ResponseAssembler::assemble(
            "q",
            "a".to_string(),
            &answerable_decision(),
            Verdict::Valid,
        )
        .unwrap();
        assert_eq!(record.confidence, ConfidenceLabel::High);
        assert!(record.verified);
        assert_eq!(record.sources.len(), 1);
    }

    #[test]
    fn invalid_verdict_demotes_but_keeps_answer() {
        let record = ResponseAssembler::assemble(
            "q",
            "the answer".to_string(),
            &answerable_decision(),
            Verdict::Invalid,
        )
        .unwrap();
        assert_eq!(record.confidence, ConfidenceLabel::Low);
        assert!(!record.verified);
        assert_eq!(record.answer, "the answer");
    }

    #[test]
    fn empty_sources_on_grounded_answer_is_a_defect() {
        let decision = GateDecision {
            status: GateStatus::Answerable,
            passages: Vec::new(),
            reason: "evidence sufficient".to_string(),
        };
        let err =
            ResponseAssembler::assemble("q", "a".to_string(), &decision, Verdict::Valid)
                .unwrap_err();
        assert!(matches!(err, AssemblyError::MissingSources { .. }));
    }

    #[test]
    fn low_confidence_render_carries_caveat_and_sources() {
        let record = ResponseAssembler::assemble(
            "q",
            "the answer".to_string(),
            &answerable_decision(),
            Verdict::Invalid,
        )
        .unwrap();
        let rendered = record.render();
        assert!(rendered.contains("the answer"));
        assert!(rendered.contains("Low confidence"));
        assert!(rendered.contains("Order-Processor Service"));
    }

    #[test]
    fn high_confidence_render_is_bare_answer() {
        let record = ResponseAssembler::assemble(
            "q",
            "the answer".to_string(),
            &answerable_decision(),
            Verdict::Valid,
        )
        .unwrap();
        assert_eq!(record.render(), "the answer");
    }

    #[test]
    fn refusal_record_has_no_sources() {
        let record = ResponseAssembler::refusal("q", "cannot answer".to_string());
        assert_eq!(record.confidence, ConfidenceLabel::NoContext);
        assert!(record.sources.is_empty());
        assert!(!record.verified);
    }
}
