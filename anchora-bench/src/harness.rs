//! Benchmark execution and aggregation.
//!
//! Each case runs the system under test as a black box, independently of
//! every other case: there is no shared mutable state, so cases run under a
//! bounded concurrent pool and only aggregation waits for all of them. A
//! panicking case is recorded as incorrect with its error captured; it never
//! aborts the run.

use crate::scoring::AnswerScorer;
use crate::suite::{Difficulty, Importance, TestCase};
use anchora_core::pipeline::QaSystem;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Outcome of one (system, case) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub case: TestCase,
    pub actual_answer: String,
    pub is_correct: bool,
    pub response_time_secs: f64,
    pub is_critical_miss: bool,
    /// Captured pipeline error, when the case failed rather than answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated accuracy report for one system.
///
/// Buckets with zero cases are absent from the maps rather than reported as
/// zero, so an empty bucket can never read as 0% accuracy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub system_name: String,
    pub total_cases: usize,
    pub correct: usize,
    pub overall_accuracy: f64,
    pub accuracy_by_difficulty: BTreeMap<Difficulty, f64>,
    pub accuracy_by_category: BTreeMap<String, f64>,
    pub mean_response_time_secs: f64,
    pub response_time_by_difficulty: BTreeMap<Difficulty, f64>,
    /// Queries of CRITICAL importance answered incorrectly.
    pub critical_misses: Vec<String>,
    pub scorer: String,
    pub generated_at: DateTime<Utc>,
}

impl BenchmarkReport {
    pub fn has_critical_misses(&self) -> bool {
        !self.critical_misses.is_empty()
    }
}

/// A system report paired with a baseline report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub system: BenchmarkReport,
    pub baseline: BenchmarkReport,
}

impl ComparisonReport {
    /// Relative improvement `(system - baseline) / baseline`; `None` when the
    /// baseline accuracy is zero.
    pub fn relative_improvement(&self) -> Option<f64> {
        relative(self.system.overall_accuracy, self.baseline.overall_accuracy)
    }

    /// Per-difficulty relative improvement for buckets present in both reports.
    pub fn improvement_by_difficulty(&self) -> BTreeMap<Difficulty, Option<f64>> {
        self.system
            .accuracy_by_difficulty
            .iter()
            .filter_map(|(d, sys)| {
                self.baseline
                    .accuracy_by_difficulty
                    .get(d)
                    .map(|base| (*d, relative(*sys, *base)))
            })
            .collect()
    }
}

fn relative(system: f64, baseline: f64) -> Option<f64> {
    (baseline > 0.0).then(|| (system - baseline) / baseline)
}

/// Drives a suite against one system and aggregates the results.
pub struct BenchmarkHarness {
    scorer: Arc<dyn AnswerScorer>,
    concurrency: usize,
}

impl BenchmarkHarness {
    pub fn new(scorer: Arc<dyn AnswerScorer>, concurrency: usize) -> Self {
        Self {
            scorer,
            concurrency: concurrency.max(1),
        }
    }

    /// Run every case against the system. Case order in the output matches the
    /// suite; execution order does not.
    pub async fn run(
        &self,
        system: Arc<dyn QaSystem>,
        cases: &[TestCase],
    ) -> Vec<EvaluationResult> {
        info!(
            system = system.name(),
            cases = cases.len(),
            concurrency = self.concurrency,
            "benchmark run starting"
        );

        let mut indexed: Vec<(usize, EvaluationResult)> =
            stream::iter(cases.iter().cloned().enumerate())
                .map(|(i, case)| {
                    let system = Arc::clone(&system);
                    let scorer = Arc::clone(&self.scorer);
                    async move {
                        let result = Self::run_case(system, scorer, case).await;
                        (i, result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, r)| r).collect()
    }

    /// Run and score one case, isolating panics from the rest of the batch.
    async fn run_case(
        system: Arc<dyn QaSystem>,
        scorer: Arc<dyn AnswerScorer>,
        case: TestCase,
    ) -> EvaluationResult {
        let query = case.query.clone();
        let started = Instant::now();
        let outcome = tokio::spawn({
            let system = Arc::clone(&system);
            let query = query.clone();
            async move { system.ask(&query).await }
        })
        .await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(record) => {
                let is_correct = scorer.score(&case, &record.answer);
                let is_critical_miss = case.importance == Importance::Critical && !is_correct;
                if is_critical_miss {
                    warn!(query = %case.query, "CRITICAL MISS");
                }
                EvaluationResult {
                    case,
                    actual_answer: record.answer,
                    is_correct,
                    response_time_secs: elapsed,
                    is_critical_miss,
                    error: None,
                }
            }
            Err(join_err) => {
                warn!(query = %case.query, error = %join_err, "case execution failed");
                let is_critical_miss = case.importance == Importance::Critical;
                EvaluationResult {
                    case,
                    actual_answer: String::new(),
                    is_correct: false,
                    response_time_secs: elapsed,
                    is_critical_miss,
                    error: Some(join_err.to_string()),
                }
            }
        }
    }

    /// Aggregate results into a report. Exact arithmetic: `correct / total`
    /// per bucket; zero-size buckets are omitted.
    pub fn aggregate(&self, system_name: &str, results: &[EvaluationResult]) -> BenchmarkReport {
        let total_cases = results.len();
        let correct = results.iter().filter(|r| r.is_correct).count();
        let overall_accuracy = if total_cases > 0 {
            correct as f64 / total_cases as f64
        } else {
            0.0
        };

        let mut by_difficulty: BTreeMap<Difficulty, (usize, usize)> = BTreeMap::new();
        let mut by_category: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        let mut time_by_difficulty: BTreeMap<Difficulty, (f64, usize)> = BTreeMap::new();
        for r in results {
            let d = by_difficulty.entry(r.case.difficulty).or_default();
            d.1 += 1;
            if r.is_correct {
                d.0 += 1;
            }
            let c = by_category.entry(r.case.category.clone()).or_default();
            c.1 += 1;
            if r.is_correct {
                c.0 += 1;
            }
            let t = time_by_difficulty.entry(r.case.difficulty).or_default();
            t.0 += r.response_time_secs;
            t.1 += 1;
        }

        let accuracy_by_difficulty = by_difficulty
            .into_iter()
            .map(|(d, (c, n))| (d, c as f64 / n as f64))
            .collect();
        let accuracy_by_category = by_category
            .into_iter()
            .map(|(k, (c, n))| (k, c as f64 / n as f64))
            .collect();
        let response_time_by_difficulty = time_by_difficulty
            .into_iter()
            .map(|(d, (sum, n))| (d, sum / n as f64))
            .collect();

        let mean_response_time_secs = if total_cases > 0 {
            results.iter().map(|r| r.response_time_secs).sum::<f64>() / total_cases as f64
        } else {
            0.0
        };

        let critical_misses = results
            .iter()
            .filter(|r| r.is_critical_miss)
            .map(|r| r.case.query.clone())
            .collect();

        BenchmarkReport {
            system_name: system_name.to_string(),
            total_cases,
            correct,
            overall_accuracy,
            accuracy_by_difficulty,
            accuracy_by_category,
            mean_response_time_secs,
            response_time_by_difficulty,
            critical_misses,
            scorer: self.scorer.name().to_string(),
            generated_at: Utc::now(),
        }
    }

    /// Run and aggregate in one step.
    pub async fn evaluate(
        &self,
        system: Arc<dyn QaSystem>,
        cases: &[TestCase],
    ) -> (BenchmarkReport, Vec<EvaluationResult>) {
        let name = system.name().to_string();
        let results = self.run(system, cases).await;
        let report = self.aggregate(&name, &results);
        (report, results)
    }
}
