//! Text generation through an external language model.
//!
//! The pipeline only ever sees [`AnswerGenerator`]: text in, text out.
//! [`OllamaGenerator`] is the concrete client for a local Ollama server using
//! the non-streaming generate API. Output is treated as non-deterministic;
//! nothing downstream may exact-match it outside the verifier.

use crate::config::GenerationConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Contract for the language model collaborator.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Generator backed by the Ollama generate API.
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f64,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Request {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else if e.is_connect() {
                    GenerationError::Unreachable {
                        base_url: self.base_url.clone(),
                        message: e.to_string(),
                    }
                } else {
                    GenerationError::Request {
                        message: e.to_string(),
                    }
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Request {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let parsed: OllamaResponse =
            resp.json().await.map_err(|e| GenerationError::ResponseParse {
                message: e.to_string(),
            })?;

        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            answer_len = parsed.response.len(),
            "generation complete"
        );
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_without_streaming() {
        let req = OllamaRequest {
            model: "qwen3:4b",
            prompt: "hello",
            stream: false,
            options: OllamaOptions { temperature: 0.7 },
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "qwen3:4b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["temperature"], 0.7);
    }
}
