//! # Anchora Core
//!
//! Core library for the Anchora answering pipeline: passage retrieval over an
//! external vector index, confidence-gated admission, grounded prompt
//! construction, generation through an external language model, independent
//! answer verification, and response assembly with mandatory source
//! attribution. The chat HTTP boundary lives here too; the benchmark harness
//! lives in `anchora-bench`.

pub mod answer;
pub mod chat;
pub mod config;
pub mod error;
pub mod gate;
pub mod generate;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod verify;

// Re-export commonly used types at the crate root.
pub use answer::{AnswerRecord, ConfidenceLabel, ResponseAssembler};
pub use config::{AnchoraConfig, GateConfig, load_config};
pub use error::{AnchoraError, ConfigError, GenerationError, RetrievalError};
pub use gate::{ConfidenceGate, GateDecision, GateStatus};
pub use generate::{AnswerGenerator, OllamaGenerator};
pub use pipeline::{BaselinePipeline, QaPipeline, QaSystem};
pub use retrieval::{ChromaRetriever, PassageMetadata, PassageRetriever, RetrievedPassage};
pub use verify::{AnswerVerifier, JudgeVerifier, LexicalVerifier, Verdict};
