//! Admission control between retrieval and generation.
//!
//! The gate converts raw retrieval output into a binary decision: either the
//! evidence justifies a grounded answer, or the pipeline must refuse. It never
//! hardcodes thresholds; [`crate::config::GateConfig`] is injected at
//! construction and can be overridden per call for benchmarking different
//! policy regimes.

use crate::config::GateConfig;
use crate::retrieval::RetrievedPassage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of the admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// Evidence is sufficient; generation may proceed grounded in `passages`.
    Answerable,
    /// Evidence is insufficient; the pipeline must produce a refusal.
    NoContext,
}

/// The gate's decision, carrying the admitted evidence and a reason string
/// suitable for logs and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDecision {
    pub status: GateStatus,
    /// Passages that passed the per-passage threshold, best-first. Empty when
    /// `status` is `NoContext`.
    pub passages: Vec<RetrievedPassage>,
    pub reason: String,
}

impl GateDecision {
    fn refused(reason: &str) -> Self {
        Self {
            status: GateStatus::NoContext,
            passages: Vec::new(),
            reason: reason.to_string(),
        }
    }
}

/// Confidence gate with injected thresholds.
#[derive(Debug, Clone)]
pub struct ConfidenceGate {
    config: GateConfig,
}

impl ConfidenceGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide admission with the gate's configured thresholds.
    pub fn decide(&self, passages: &[RetrievedPassage]) -> GateDecision {
        Self::decide_with(passages, &self.config)
    }

    /// Decide admission under an explicit threshold regime.
    ///
    /// Policy (conservative, no aggregate compensation):
    /// 1. empty retrieval -> refuse ("no matches");
    /// 2. best passage over `max_distance` -> refuse ("low relevance");
    /// 3. fewer than `min_results` passages individually under the threshold
    ///    -> refuse ("insufficient corroboration");
    /// 4. otherwise admit the passing subset, retrieval order preserved.
    pub fn decide_with(passages: &[RetrievedPassage], config: &GateConfig) -> GateDecision {
        if passages.is_empty() {
            debug!("gate refused: retrieval returned no passages");
            return GateDecision::refused("no matches");
        }

        // Retrieval order is best-first; the first passage carries the best score.
        let best = &passages[0];
        if best.distance > config.max_distance {
            debug!(
                best_distance = best.distance,
                max_distance = config.max_distance,
                "gate refused: best passage below relevance threshold"
            );
            return GateDecision::refused("low relevance");
        }

        // Stable filter: equal-scored passages keep their retrieval order.
        let passing: Vec<RetrievedPassage> = passages
            .iter()
            .filter(|p| p.distance <= config.max_distance)
            .cloned()
            .collect();

        if passing.len() < config.min_results {
            debug!(
                passing = passing.len(),
                min_results = config.min_results,
                "gate refused: too few corroborating passages"
            );
            return GateDecision::refused("insufficient corroboration");
        }

        GateDecision {
            status: GateStatus::Answerable,
            passages: passing,
            reason: "evidence sufficient".to_string(),
        }
    }
}
