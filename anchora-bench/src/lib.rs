//! # Anchora Bench
//!
//! Stratified accuracy benchmark harness for answering systems. Drives a
//! validated test suite against any [`anchora_core::pipeline::QaSystem`] as a
//! black box, scores correctness through a pluggable strategy, and aggregates
//! accuracy by difficulty, category, and importance, with comparative
//! reporting against a baseline.

pub mod harness;
pub mod report;
pub mod scoring;
pub mod suite;

pub use harness::{BenchmarkHarness, BenchmarkReport, ComparisonReport, EvaluationResult};
pub use report::{render_comparison, render_text, save_json};
pub use scoring::{AnswerScorer, ExactMatchScorer, KeywordScorer, SubstringScorer};
pub use suite::{Difficulty, Importance, SuiteError, TestCase, builtin_suite, load_suite};
