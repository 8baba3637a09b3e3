//! Passage retrieval over an external vector index.
//!
//! The pipeline consumes retrieval through the [`PassageRetriever`] trait;
//! [`ChromaRetriever`] is the concrete client for a Chroma HTTP server. An
//! empty result set is a valid, observable return value, never an error.

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Provenance metadata carried with every retrieved passage and surfaced as
/// source attribution on answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    pub source_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// A candidate passage returned by the vector index, best-first.
///
/// `distance` is cosine distance: lower means more relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub distance: f32,
    pub metadata: PassageMetadata,
}

/// Contract for querying the vector index.
///
/// Implementations must return passages ordered best-first and must not map
/// "no matches" into an error.
#[async_trait]
pub trait PassageRetriever: Send + Sync {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError>;
}

/// Retriever backed by the Chroma HTTP API.
pub struct ChromaRetriever {
    client: Client,
    base_url: String,
    collection: String,
    timeout_secs: u64,
    /// Collection UUID resolved lazily on first search.
    collection_id: tokio::sync::OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct ChromaCollection {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChromaQueryResponse {
    documents: Option<Vec<Vec<String>>>,
    metadatas: Option<Vec<Vec<Option<serde_json::Map<String, serde_json::Value>>>>>,
    distances: Option<Vec<Vec<f32>>>,
}

impl ChromaRetriever {
    /// Create a retriever from configuration. Does not contact the server;
    /// collection resolution happens on first query.
    pub fn new(config: &RetrievalConfig) -> Result<Self, RetrievalError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RetrievalError::Request {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            timeout_secs: config.timeout_secs,
            collection_id: tokio::sync::OnceCell::new(),
        })
    }

    /// Resolve the collection name to its UUID via `GET /api/v1/collections`.
    async fn resolve_collection(&self) -> Result<String, RetrievalError> {
        let url = format!("{}/api/v1/collections", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let collections: Vec<ChromaCollection> =
            resp.json().await.map_err(|e| RetrievalError::ResponseParse {
                message: e.to_string(),
            })?;
        collections
            .into_iter()
            .find(|c| c.name == self.collection)
            .map(|c| c.id)
            .ok_or_else(|| RetrievalError::CollectionNotFound {
                name: self.collection.clone(),
            })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> RetrievalError {
        if e.is_timeout() {
            RetrievalError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            RetrievalError::Unreachable {
                base_url: self.base_url.clone(),
                message: e.to_string(),
            }
        } else {
            RetrievalError::Request {
                message: e.to_string(),
            }
        }
    }

    fn passage_from_parts(
        text: String,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
        distance: f32,
    ) -> RetrievedPassage {
        let meta = metadata.unwrap_or_default();
        let str_field = |key: &str| {
            meta.get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        RetrievedPassage {
            text,
            distance,
            metadata: PassageMetadata {
                source_id: str_field("source_id")
                    .or_else(|| str_field("page_id"))
                    .unwrap_or_default(),
                title: str_field("title").unwrap_or_default(),
                url: str_field("url"),
                last_modified: str_field("last_modified")
                    .and_then(|s| s.parse::<DateTime<Utc>>().ok()),
            },
        }
    }
}

#[async_trait]
impl PassageRetriever for ChromaRetriever {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        let collection_id = self
            .collection_id
            .get_or_try_init(|| self.resolve_collection())
            .await?
            .clone();

        let url = format!(
            "{}/api/v1/collections/{}/query",
            self.base_url, collection_id
        );
        let body = json!({
            "query_texts": [query],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"],
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(%status, "Chroma query returned non-success status");
            return Err(RetrievalError::Request {
                message: format!("HTTP {status}: {text}"),
            });
        }

        let parsed: ChromaQueryResponse =
            resp.json().await.map_err(|e| RetrievalError::ResponseParse {
                message: e.to_string(),
            })?;

        // Chroma nests results per query; we send exactly one query.
        let documents = parsed
            .documents
            .and_then(|mut d| (!d.is_empty()).then(|| d.remove(0)))
            .unwrap_or_default();
        let metadatas = parsed
            .metadatas
            .and_then(|mut m| (!m.is_empty()).then(|| m.remove(0)))
            .unwrap_or_default();
        let distances = parsed
            .distances
            .and_then(|mut d| (!d.is_empty()).then(|| d.remove(0)))
            .unwrap_or_default();

        let passages: Vec<RetrievedPassage> = documents
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                Self::passage_from_parts(
                    text,
                    metadatas.get(i).cloned().flatten(),
                    distances.get(i).copied().unwrap_or(f32::MAX),
                )
            })
            .collect();

        debug!(
            query_len = query.len(),
            returned = passages.len(),
            "vector index query complete"
        );
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn passage_metadata_extracted_from_chroma_fields() {
        let mut meta = serde_json::Map::new();
        meta.insert("source_id".into(), "12345".into());
        meta.insert("title".into(), "Order-Processor Service".into());
        meta.insert(
            "url".into(),
            "https://wiki.example.com/pages/12345".into(),
        );

        let passage =
            ChromaRetriever::passage_from_parts("some text".to_string(), Some(meta), 0.21);
        assert_eq!(passage.metadata.source_id, "12345");
        assert_eq!(passage.metadata.title, "Order-Processor Service");
        assert_eq!(
            passage.metadata.url.as_deref(),
            Some("https://wiki.example.com/pages/12345")
        );
        assert_eq!(passage.distance, 0.21);
    }

    #[test]
    fn page_id_accepted_as_source_id_fallback() {
        let mut meta = serde_json::Map::new();
        meta.insert("page_id".into(), "98765".into());
        let passage = ChromaRetriever::passage_from_parts("t".to_string(), Some(meta), 0.5);
        assert_eq!(passage.metadata.source_id, "98765");
    }

    #[test]
    fn missing_metadata_yields_empty_attribution_fields() {
        let passage = ChromaRetriever::passage_from_parts("t".to_string(), None, 0.5);
        assert_eq!(passage.metadata, PassageMetadata::default());
    }
}
