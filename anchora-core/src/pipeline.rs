//! The per-question answering pipeline.
//!
//! A single sequential chain: retrieve, gate, build prompt, generate, verify,
//! assemble. Every external call is bounded by a timeout, and every
//! collaborator failure folds into a safe outcome rather than propagating:
//! retrieval or generation failure becomes a refusal, verification failure
//! becomes a low-confidence demotion. Callers of [`QaSystem::ask`] always get
//! an [`AnswerRecord`]; there is no fourth user-visible state.

use crate::answer::{AnswerRecord, ResponseAssembler};
use crate::config::{AnchoraConfig, GateConfig};
use crate::gate::{ConfidenceGate, GateStatus};
use crate::generate::AnswerGenerator;
use crate::prompt::{grounded_prompt, refusal_prompt};
use crate::retrieval::PassageRetriever;
use crate::verify::{AnswerVerifier, Verdict};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Refusal text used when even the refusal phrasing call fails.
const REFUSAL_FALLBACK: &str = "I can't answer that from the current knowledge base. \
     Try rephrasing the question, checking other documentation, or asking a team \
     member who may know.";

/// A complete question-answering system, as seen by the chat boundary and the
/// benchmark harness. Infallible at this seam: all collaborator failures have
/// already been folded into the record.
#[async_trait]
pub trait QaSystem: Send + Sync {
    async fn ask(&self, question: &str) -> AnswerRecord;

    /// Short name used in benchmark reports.
    fn name(&self) -> &str;
}

/// The confidence-gated answering pipeline.
pub struct QaPipeline {
    retriever: Arc<dyn PassageRetriever>,
    generator: Arc<dyn AnswerGenerator>,
    verifier: Arc<dyn AnswerVerifier>,
    gate: ConfidenceGate,
    top_k: usize,
    retrieval_timeout: Duration,
    generation_timeout: Duration,
    verification_timeout: Duration,
}

impl QaPipeline {
    pub fn new(
        retriever: Arc<dyn PassageRetriever>,
        generator: Arc<dyn AnswerGenerator>,
        verifier: Arc<dyn AnswerVerifier>,
        config: &AnchoraConfig,
    ) -> Self {
        Self {
            retriever,
            generator,
            verifier,
            gate: ConfidenceGate::new(config.gate),
            top_k: config.retrieval.top_k,
            retrieval_timeout: Duration::from_secs(config.retrieval.timeout_secs),
            generation_timeout: Duration::from_secs(config.generation.timeout_secs),
            verification_timeout: Duration::from_secs(config.verifier.timeout_secs),
        }
    }

    /// Replace the gate thresholds, e.g. for benchmarking policy regimes.
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = ConfidenceGate::new(gate);
        self
    }

    /// Produce a refusal record, asking the generator only for phrasing.
    async fn refuse(&self, question: &str) -> AnswerRecord {
        let phrased = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&refusal_prompt(question)),
        )
        .await;
        let text = match phrased {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Err(e)) => {
                warn!(error = %e, "refusal phrasing failed, using fallback text");
                REFUSAL_FALLBACK.to_string()
            }
            _ => REFUSAL_FALLBACK.to_string(),
        };
        ResponseAssembler::refusal(question, text)
    }
}

#[async_trait]
impl QaSystem for QaPipeline {
    async fn ask(&self, question: &str) -> AnswerRecord {
        // 1. Retrieve. Unreachable index or timeout folds to a refusal.
        let retrieved = tokio::time::timeout(
            self.retrieval_timeout,
            self.retriever.search(question, self.top_k),
        )
        .await;
        let passages = match retrieved {
            Ok(Ok(passages)) => passages,
            Ok(Err(e)) => {
                warn!(error = %e, "retrieval failed, refusing");
                return self.refuse(question).await;
            }
            Err(_) => {
                warn!("retrieval timed out, refusing");
                return self.refuse(question).await;
            }
        };

        // 2. Gate.
        let decision = self.gate.decide(&passages);
        if decision.status == GateStatus::NoContext {
            info!(reason = %decision.reason, "gate refused");
            return self.refuse(question).await;
        }

        // 3-4. Grounded prompt and generation.
        let prompt = grounded_prompt(question, &decision.passages);
        let generated = tokio::time::timeout(
            self.generation_timeout,
            self.generator.generate(&prompt),
        )
        .await;
        let answer = match generated {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(error = %e, "generation failed, refusing");
                return self.refuse(question).await;
            }
            Err(_) => {
                warn!("generation timed out, refusing");
                return self.refuse(question).await;
            }
        };

        // 5. Verify. Any failure demotes; it never upgrades or aborts.
        let verdict = match tokio::time::timeout(
            self.verification_timeout,
            self.verifier.verify(question, &answer, &decision.passages),
        )
        .await
        {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                warn!(error = %e, "verification failed, demoting to low confidence");
                Verdict::Invalid
            }
            Err(_) => {
                warn!("verification timed out, demoting to low confidence");
                Verdict::Invalid
            }
        };

        // 6. Assemble. An Answerable decision always carries passages, so the
        // attribution invariant holds here; a violation is a pipeline defect.
        match ResponseAssembler::assemble(question, answer, &decision, verdict) {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "assembly invariant violated, refusing");
                self.refuse(question).await
            }
        }
    }

    fn name(&self) -> &str {
        "gated-pipeline"
    }
}

/// Naive baseline: top-1 vector search, raw excerpt, no gate or verification.
///
/// Exists so benchmark comparisons isolate what the gated pipeline adds over
/// plain semantic search.
pub struct BaselinePipeline {
    retriever: Arc<dyn PassageRetriever>,
    excerpt_chars: usize,
}

impl BaselinePipeline {
    pub fn new(retriever: Arc<dyn PassageRetriever>) -> Self {
        Self {
            retriever,
            excerpt_chars: 500,
        }
    }
}

#[async_trait]
impl QaSystem for BaselinePipeline {
    async fn ask(&self, question: &str) -> AnswerRecord {
        let passages = match self.retriever.search(question, 1).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!(error = %e, "baseline retrieval failed");
                return ResponseAssembler::refusal(question, REFUSAL_FALLBACK.to_string());
            }
        };
        match passages.into_iter().next() {
            Some(best) => {
                let excerpt: String = if best.text.chars().count() > self.excerpt_chars {
                    let truncated: String = best.text.chars().take(self.excerpt_chars).collect();
                    format!("{truncated}...")
                } else {
                    best.text.clone()
                };
                AnswerRecord {
                    question: question.to_string(),
                    answer: excerpt,
                    confidence: crate::answer::ConfidenceLabel::Low,
                    sources: vec![best.metadata],
                    verified: false,
                    answered_at: chrono::Utc::now(),
                }
            }
            None => ResponseAssembler::refusal(
                question,
                "No relevant information found.".to_string(),
            ),
        }
    }

    fn name(&self) -> &str {
        "baseline-vector-search"
    }
}
