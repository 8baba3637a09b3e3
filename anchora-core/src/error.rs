//! Error types for the Anchora answering pipeline.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering retrieval, generation, configuration, and assembly domains.
//!
//! Evidence insufficiency is deliberately NOT an error: the gate returning
//! `NoContext` is a first-class outcome carried in [`crate::gate::GateDecision`],
//! and collaborator failures are folded into refusal records at the pipeline
//! boundary rather than surfaced to callers of [`crate::pipeline::QaSystem`].

/// Top-level error type for the Anchora core library.
#[derive(Debug, thiserror::Error)]
pub enum AnchoraError {
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the vector index collaborator.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Vector index request failed: {message}")]
    Request { message: String },

    #[error("Vector index response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Vector index unreachable at {base_url}: {message}")]
    Unreachable { base_url: String, message: String },

    #[error("Retrieval timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Errors from the language model collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Model request failed: {message}")]
    Request { message: String },

    #[error("Model response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Model unreachable at {base_url}: {message}")]
    Unreachable { base_url: String, message: String },

    #[error("Generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: std::path::PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Invalid gate threshold {value}: {reason}")]
    InvalidThreshold { value: f32, reason: String },
}

/// Errors from response assembly.
///
/// An assembly error indicates a pipeline defect, not a degraded answer:
/// the source-attribution invariant was violated upstream.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("Answer with confidence {label} carries no source attribution")]
    MissingSources { label: String },
}
