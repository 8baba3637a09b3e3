//! Correctness scoring strategies.
//!
//! The default [`KeywordScorer`] is a deliberately coarse approximation:
//! case-insensitive content-term containment between the expected and actual
//! answers. It lives behind [`AnswerScorer`] so a semantic-equivalence scorer
//! can replace it without touching the harness.

use crate::suite::{Difficulty, TestCase};

/// Strategy seam for judging whether an answer matches the expectation.
pub trait AnswerScorer: Send + Sync {
    fn score(&self, case: &TestCase, actual: &str) -> bool;

    /// Name recorded in report metadata.
    fn name(&self) -> &str;
}

/// Case-insensitive content-term containment.
///
/// A case counts as correct when at least `threshold` of the expected
/// answer's content terms appear in the actual answer; HARD cases use the
/// laxer `threshold_hard` since their expected answers are long prose.
pub struct KeywordScorer {
    threshold: f64,
    threshold_hard: f64,
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            threshold_hard: 0.5,
        }
    }
}

impl KeywordScorer {
    pub fn new(threshold: f64, threshold_hard: f64) -> Self {
        Self {
            threshold,
            threshold_hard,
        }
    }

    fn content_terms(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')' | '"'))
            .map(|w| w.trim_matches(|c: char| matches!(c, '.' | ':' | '!' | '?')))
            .filter(|w| w.len() > 3 && !matches!(*w, "that" | "with" | "from" | "this"))
            .map(str::to_string)
            .collect()
    }

    /// Fraction of expected content terms present in the actual answer.
    pub fn hit_ratio(expected: &str, actual: &str) -> f64 {
        let terms = Self::content_terms(expected);
        if terms.is_empty() {
            // No content terms to check: fall back to whole-string containment.
            return if actual.to_lowercase().contains(&expected.to_lowercase()) {
                1.0
            } else {
                0.0
            };
        }
        let actual_lower = actual.to_lowercase();
        let hits = terms.iter().filter(|t| actual_lower.contains(t.as_str())).count();
        hits as f64 / terms.len() as f64
    }
}

impl AnswerScorer for KeywordScorer {
    fn score(&self, case: &TestCase, actual: &str) -> bool {
        let ratio = Self::hit_ratio(&case.expected_answer, actual);
        let threshold = if case.difficulty == Difficulty::Hard {
            self.threshold_hard
        } else {
            self.threshold
        };
        ratio >= threshold
    }

    fn name(&self) -> &str {
        "keyword-containment"
    }
}

/// Exact string equality after trimming and case folding. Mostly useful for
/// fixtures and sanity checks, not free-form model output.
pub struct ExactMatchScorer;

impl AnswerScorer for ExactMatchScorer {
    fn score(&self, case: &TestCase, actual: &str) -> bool {
        case.expected_answer.trim().to_lowercase() == actual.trim().to_lowercase()
    }

    fn name(&self) -> &str {
        "exact-match"
    }
}

/// Whole-expected-answer substring containment, case-insensitive.
pub struct SubstringScorer;

impl AnswerScorer for SubstringScorer {
    fn score(&self, case: &TestCase, actual: &str) -> bool {
        actual
            .to_lowercase()
            .contains(&case.expected_answer.trim().to_lowercase())
    }

    fn name(&self) -> &str {
        "substring"
    }
}
