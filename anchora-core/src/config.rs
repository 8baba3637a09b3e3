//! Configuration system for Anchora.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment.
//! Configuration is loaded from `anchora.toml` in the working directory (or an
//! explicit path) and overridden by `ANCHORA_`-prefixed environment variables
//! (e.g. `ANCHORA_GATE__MAX_DISTANCE=0.3`).
//!
//! Gate thresholds are carried here and injected into [`crate::gate::ConfidenceGate`]
//! at construction; no module hardcodes them.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the Anchora pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnchoraConfig {
    pub retrieval: RetrievalConfig,
    pub gate: GateConfig,
    pub generation: GenerationConfig,
    pub verifier: VerifierConfig,
    pub server: ServerConfig,
    pub bench: BenchConfig,
}

/// Configuration for the vector index collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Base URL of the Chroma HTTP API.
    pub base_url: String,
    /// Collection holding the document corpus.
    pub collection: String,
    /// How many candidate passages to request per query.
    pub top_k: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            collection: "team_knowledge".to_string(),
            top_k: 5,
            timeout_secs: 30,
        }
    }
}

/// Admission-control thresholds for the confidence gate.
///
/// `max_distance` is the worst cosine distance a passage may have and still
/// count as evidence; `min_results` is the minimum number of passing passages
/// required before generation is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    pub max_distance: f32,
    pub min_results: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_distance: 0.45,
            min_results: 2,
        }
    }
}

impl GateConfig {
    /// Validate threshold sanity. Cosine distance lives in [0, 2].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                value: self.max_distance,
                reason: "max_distance must be a finite non-negative number".to_string(),
            });
        }
        if self.min_results == 0 {
            return Err(ConfigError::Invalid {
                message: "gate.min_results must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration for the language model collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the Ollama API.
    pub base_url: String,
    /// Model identifier (e.g. `qwen3:4b`, `llama3.1:8b`).
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen3:4b".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// Configuration for the answer verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Verification mode: a second model judgment or a deterministic
    /// lexical-overlap check.
    pub mode: VerifierMode,
    /// Minimum content-term overlap for the lexical verifier to accept a claim.
    pub lexical_overlap_floor: f64,
    /// Judgment request timeout in seconds.
    pub timeout_secs: u64,
}

/// Which verifier implementation backs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifierMode {
    /// Second model invocation judging entailment.
    Judge,
    /// Rule-based content-term overlap check. Deterministic; no model call.
    Lexical,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            mode: VerifierMode::Judge,
            lexical_overlap_floor: 0.3,
            timeout_secs: 60,
        }
    }
}

/// Configuration for the chat HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
        }
    }
}

/// Configuration for benchmark runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Directory for JSON report artifacts.
    pub output_dir: PathBuf,
    /// Bounded worker pool size for concurrent cases.
    pub concurrency: usize,
    /// Number of cases used by quick runs.
    pub quick_cases: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            concurrency: 4,
            quick_cases: 8,
        }
    }
}

/// Load configuration with layered precedence: defaults, then `anchora.toml`
/// (explicit path or working directory), then `ANCHORA_`-prefixed environment
/// variables with `__` section separators.
pub fn load_config(path: Option<&Path>) -> Result<AnchoraConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(AnchoraConfig::default()));

    match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::FileNotFound { path: p.to_path_buf() });
            }
            figment = figment.merge(Toml::file(p));
        }
        None => {
            let default_path = Path::new("anchora.toml");
            if default_path.exists() {
                figment = figment.merge(Toml::file(default_path));
            }
        }
    }

    figment = figment.merge(Env::prefixed("ANCHORA_").split("__"));

    let config: AnchoraConfig = figment.extract().map_err(|e| ConfigError::Invalid {
        message: e.to_string(),
    })?;
    config.gate.validate()?;
    Ok(config)
}
