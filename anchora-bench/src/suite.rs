//! Benchmark test-case schema and the builtin stratified suite.
//!
//! Cases are a closed record: unknown fields and missing required fields are
//! rejected at load time, and difficulty/importance are enumerated domains
//! rather than free strings. The builtin suite covers the team-knowledge
//! corpus (Order-Processor, User-Profile, and Notification-Dispatcher service
//! pages), stratified 5 EASY / 5 MEDIUM / 7 HARD.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How hard a case is for a retrieval-grounded system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "EASY"),
            Difficulty::Medium => write!(f, "MEDIUM"),
            Difficulty::Hard => write!(f, "HARD"),
        }
    }
}

/// How much an incorrect answer matters. `Critical` misses are a
/// release-blocking signal in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

/// A single benchmark case. Static once loaded; never mutated at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub query: String,
    pub expected_answer: String,
    pub ground_truth_location: String,
    pub difficulty: Difficulty,
    pub importance: Importance,
    pub category: String,
    /// Note on the reasoning required, for MEDIUM and HARD cases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_note: Option<String>,
}

/// Errors from loading a suite file.
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error("Suite file not found: {path}")]
    FileNotFound { path: std::path::PathBuf },

    #[error("Suite file unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Suite schema violation: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("Suite is empty")]
    Empty,
}

/// Load a suite from a JSON file: an array of [`TestCase`] records.
///
/// Rejects unknown fields, missing required fields, and out-of-domain
/// difficulty or importance values.
pub fn load_suite(path: &Path) -> Result<Vec<TestCase>, SuiteError> {
    if !path.exists() {
        return Err(SuiteError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    let cases: Vec<TestCase> = serde_json::from_str(&raw)?;
    if cases.is_empty() {
        return Err(SuiteError::Empty);
    }
    Ok(cases)
}

fn case(
    query: &str,
    expected_answer: &str,
    ground_truth_location: &str,
    difficulty: Difficulty,
    importance: Importance,
    category: &str,
    reasoning_note: Option<&str>,
) -> TestCase {
    TestCase {
        query: query.to_string(),
        expected_answer: expected_answer.to_string(),
        ground_truth_location: ground_truth_location.to_string(),
        difficulty,
        importance,
        category: category.to_string(),
        reasoning_note: reasoning_note.map(str::to_string),
    }
}

/// The builtin stratified suite over the team-knowledge corpus.
pub fn builtin_suite() -> Vec<TestCase> {
    use Difficulty::*;
    use Importance::*;

    vec![
        // EASY - simple factual lookup
        case(
            "What Kafka topic does the Order-Processor Service consume from?",
            "new-orders",
            "Order-Processor Service - Overview section",
            Easy,
            Importance::Medium,
            "Configuration",
            None,
        ),
        case(
            "How many replicas does the Order-Processor Service have in production?",
            "3 replicas",
            "Order-Processor Service - Overview section",
            Easy,
            Importance::Medium,
            "Architecture",
            None,
        ),
        case(
            "What programming language is the User-Profile Service written in?",
            "Java 17",
            "User-Profile Service - Tech Stack section",
            Easy,
            Low,
            "Technology",
            None,
        ),
        case(
            "What framework does the Notification-Dispatcher Service use?",
            "Spring Boot 2.7.x",
            "Notification-Dispatcher Service - Overview section",
            Easy,
            Low,
            "Technology",
            None,
        ),
        case(
            "How many retry attempts does Order-Processor have for standard errors?",
            "3 retry attempts with 3-second backoff",
            "Order-Processor Service - Error Handling section",
            Easy,
            Importance::Medium,
            "Error Handling",
            None,
        ),
        // MEDIUM - requires context understanding
        case(
            "What happens when the Payment Gateway has repeated 5xx errors?",
            "Kafka listener stops and orders are written to local H2 database file",
            "Order-Processor Service - Error Handling section, paragraph 2",
            Difficulty::Medium,
            High,
            "Error Handling",
            Some(
                "Must connect '5xx errors' with 'PAYMENT_HALT state' and understand \
                 the fallback mechanism",
            ),
        ),
        case(
            "Why was the Email Template Throttling project abandoned?",
            "In-memory ConcurrentHashMap approach doesn't work in multi-replica deployment",
            "Notification-Dispatcher Service - Project Backlog section",
            Difficulty::Medium,
            Importance::Medium,
            "Architecture",
            Some(
                "Must understand the connection between implementation approach and \
                 deployment constraints",
            ),
        ),
        case(
            "What triggers the GDPR forget-me functionality?",
            "DELETE /api/v2/users/{userId}/forget endpoint, currently in development",
            "User-Profile Service - Current Development section",
            Difficulty::Medium,
            High,
            "Compliance",
            Some("Must understand GDPR context and current development status"),
        ),
        case(
            "What's the difference between soft delete and GDPR forget-me for users?",
            "Soft delete sets is_active=false but keeps PII; GDPR forget-me scrubs all \
             PII asynchronously",
            "User-Profile Service - API Endpoints and Current Development sections",
            Difficulty::Medium,
            High,
            "Compliance",
            Some("Must compare two different deletion approaches across different sections"),
        ),
        case(
            "What monitoring issue exists with the Notification-Dispatcher Service?",
            "Kafka consumer lag spikes during high traffic and SendGrid rate limit issues",
            "Notification-Dispatcher Service - Known Production Issues section",
            Difficulty::Medium,
            High,
            "Operations",
            None,
        ),
        // HARD - buried info, multi-hop reasoning
        case(
            "What are the data loss risks in the Order-Processor Service?",
            "Pod restart during PAYMENT_HALT state causes permanent order loss from \
             local H2 file",
            "Order-Processor Service - Error Handling section, buried in dense paragraph",
            Hard,
            Critical,
            "Risk Management",
            Some(
                "Must connect payment errors -> PAYMENT_HALT -> H2 file -> pod restart \
                 -> data loss",
            ),
        ),
        case(
            "Which parts of the Order-Processor system have no test coverage?",
            "LegacyPaymentFallback class - the deprecated payment fallback mechanism",
            "Order-Processor Service - Error Handling section, end of paragraph 2",
            Hard,
            Critical,
            "Code Quality",
            Some("Must find and understand significance of 'no test coverage' mention"),
        ),
        case(
            "What deprecated systems are still running in production?",
            "LegacyPaymentFallback class handles payment errors but is marked \
             @Deprecated yet still active",
            "Order-Processor Service - Error Handling section",
            Hard,
            High,
            "Technical Debt",
            Some("Must understand code annotation vs runtime status contradiction"),
        ),
        case(
            "What configuration security issue exists in Order-Processor?",
            "Redis connection string is hardcoded in RedisConfig.java line 47, needs \
             externalization",
            "Order-Processor Service - Configuration section, warning note",
            Hard,
            High,
            "Security",
            Some("Must recognize hardcoded credentials as security vulnerability"),
        ),
        case(
            "Who left the company and what knowledge was lost?",
            "Original developer of LegacyPaymentFallback is no longer with team, and \
             previous tech lead Mark Johnson left Feb 2023",
            "Order-Processor Service - multiple sections",
            Hard,
            High,
            "Knowledge Management",
            Some("Must connect personnel changes with knowledge gaps and system risks"),
        ),
        case(
            "What's the cost analysis result for the batching optimization?",
            "Savings would be only ~$200/month, so product team deprioritized the feature",
            "Notification-Dispatcher Service - Investigation section",
            Hard,
            Importance::Medium,
            "Business Analysis",
            Some("Must connect technical complexity with business value assessment"),
        ),
        case(
            "What blocks the Spring Boot 3.x upgrade for Notification-Dispatcher?",
            "Blocked by Java 17 to 21 upgrade waiting for infrastructure team to update \
             Docker base images",
            "Notification-Dispatcher Service - Project Backlog, Spring Boot 3.x item",
            Hard,
            Importance::Medium,
            "Dependencies",
            Some(
                "Must trace dependency chain: Spring Boot upgrade -> Java upgrade -> \
                 Infrastructure team -> Docker images",
            ),
        ),
    ]
}
