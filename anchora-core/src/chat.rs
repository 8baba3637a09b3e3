//! Chat HTTP boundary built on axum.
//!
//! A deliberately thin surface: `POST /chat` takes `{message}` and returns
//! `{response}`, where the response is the answer text with a confidence and
//! sources footer appended for anything below high confidence. The pipeline
//! guarantees there is no fourth state behind this endpoint: an answer, a
//! caveated answer, or an explicit refusal.

use crate::config::ServerConfig;
use crate::pipeline::QaSystem;
use axum::{Json, Router, extract::State, routing::{get, post}};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Shared handle to the answering system for axum handlers.
pub type SharedQa = Arc<dyn QaSystem>;

/// Request body for `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub message: String,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Build the chat router.
pub fn chat_router(qa: SharedQa) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(qa)
}

async fn chat_handler(
    State(qa): State<SharedQa>,
    Json(msg): Json<ChatMessage>,
) -> Json<ChatResponse> {
    let question = msg.message.trim();
    if question.is_empty() {
        return Json(ChatResponse {
            response: "Please enter a question.".to_string(),
        });
    }
    let record = qa.ask(question).await;
    info!(
        confidence = %record.confidence,
        sources = record.sources.len(),
        "chat request answered"
    );
    Json(ChatResponse {
        response: record.render(),
    })
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Bind and serve the chat boundary until the task is cancelled.
pub async fn run(qa: SharedQa, config: &ServerConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "chat boundary listening");
    axum::serve(listener, chat_router(qa)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{AnswerRecord, ConfidenceLabel, ResponseAssembler};
    use async_trait::async_trait;
    use axum::body::Body;
    use tower::ServiceExt;

    struct CannedQa {
        record: AnswerRecord,
    }

    #[async_trait]
    impl QaSystem for CannedQa {
        async fn ask(&self, _question: &str) -> AnswerRecord {
            self.record.clone()
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn post_chat(message: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({ "message": message }).to_string(),
            ))
            .unwrap()
    }

    async fn send(router: Router, req: axum::http::Request<Body>) -> serde_json::Value {
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn high_confidence_qa() -> SharedQa {
        Arc::new(CannedQa {
            record: AnswerRecord {
                question: "q".to_string(),
                answer: "new-orders".to_string(),
                confidence: ConfidenceLabel::High,
                sources: vec![crate::retrieval::PassageMetadata {
                    source_id: "1".to_string(),
                    title: "Order-Processor Service".to_string(),
                    url: None,
                    last_modified: None,
                }],
                verified: true,
                answered_at: chrono::Utc::now(),
            },
        })
    }

    #[tokio::test]
    async fn chat_returns_bare_answer_for_high_confidence() {
        let json = send(chat_router(high_confidence_qa()), post_chat("what topic?")).await;
        assert_eq!(json["response"], "new-orders");
    }

    #[tokio::test]
    async fn chat_returns_refusal_text_for_no_context() {
        let qa: SharedQa = Arc::new(CannedQa {
            record: ResponseAssembler::refusal("q", "I can't answer that.".to_string()),
        });
        let json = send(chat_router(qa), post_chat("unknown thing?")).await;
        assert_eq!(json["response"], "I can't answer that.");
    }

    #[tokio::test]
    async fn empty_message_prompts_for_input() {
        let json = send(chat_router(high_confidence_qa()), post_chat("   ")).await;
        assert_eq!(json["response"], "Please enter a question.");
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let req = axum::http::Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let json = send(chat_router(high_confidence_qa()), req).await;
        assert_eq!(json["status"], "ok");
    }
}
