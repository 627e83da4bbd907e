//! # HTTP server
//!
//! The web-facing surface of the prototype: a small axum router that accepts
//! a question plus prior history as JSON and streams the answer back as a
//! plain text body, token by token.
//!
//! The chat handler is a pass-through pipe: provider stream events are
//! forwarded into the response body in arrival order, and the body ends when
//! the provider signals completion. There is no buffering policy, no
//! reconnection or resume logic, and no flow control beyond what hyper
//! provides. Failures anywhere in the chain are caught at the request
//! boundary and surfaced as a 500 with a plain `{"error": ...}` message.
//!
//! ## Routes
//! - `POST /api/chat` — `{query, history}` → streamed answer text
//! - `POST /api/ingest` — chunk, embed, and upsert the documents directory
//! - `POST /api/generate` — `{prompt}` → whole completion over the in-memory log
//! - `POST /api/reset` — clear the in-memory log
//! - `GET /health`

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    BoxError, api,
    api::AnswerStream,
    config::RagtagConfig,
    embeddings::EmbeddingsClient,
    history::{ChatItem, MessageLog, render_history},
    ingest,
    template::ChatTemplate,
    vector_store::VectorStore,
};

/// Shared state handed to every handler.
pub struct AppState {
    pub config: RagtagConfig,
    pub template: ChatTemplate,
    pub openai: async_openai::Client<async_openai::config::OpenAIConfig>,
    pub embeddings: EmbeddingsClient,
    pub store: VectorStore,
    /// In-memory message list for `/api/generate`; a prototype shortcut.
    pub log: MessageLog,
}

impl AppState {
    /// Build all provider clients from configuration.
    pub fn new(config: RagtagConfig, template: ChatTemplate) -> Result<Self, BoxError> {
        let openai = api::create_client(&config)?;
        let embeddings = EmbeddingsClient::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.embedding_model.clone(),
        );
        let store = VectorStore::new(
            config.vector_api_base.clone(),
            config.vector_api_key.clone(),
            config.index_name.clone(),
        );

        Ok(Self {
            config,
            template,
            openai,
            embeddings,
            store,
            log: MessageLog::new(),
        })
    }
}

/// Body of `POST /api/chat`: the question plus the browser-side transcript.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<ChatItem>,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/ingest", post(run_ingest))
        .route("/api/generate", post(generate))
        .route("/api/reset", post(reset))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(
    config: RagtagConfig,
    template: ChatTemplate,
    addr_override: Option<String>,
) -> Result<(), BoxError> {
    let addr = addr_override.unwrap_or_else(|| config.listen_addr.clone());
    let state = Arc::new(AppState::new(config, template)?);
    let app = router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Every failure mode collapses to the same shape: 500 plus a plain message.
fn internal_error(err: BoxError) -> Response {
    error!("request failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string() })),
    )
        .into_response()
}

/// Retrieve context for the question and open the provider token stream.
async fn answer_pipeline(state: &AppState, request: &ChatRequest) -> Result<AnswerStream, BoxError> {
    let context = api::retrieve_context(
        &state.embeddings,
        &state.store,
        &request.query,
        state.config.top_k,
    )
    .await?;

    let history = render_history(&request.history);
    let messages = api::build_messages(&state.template, &history, &context, &request.query);

    api::answer_stream(&state.openai, &state.config, messages).await
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    match answer_pipeline(&state, &request).await {
        Ok(stream) => {
            let body = Body::from_stream(stream.map(|event| event.map(String::into_bytes)));
            (
                [
                    (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => internal_error(err),
    }
}

async fn run_ingest(State(state): State<Arc<AppState>>) -> Response {
    let dir = PathBuf::from(&state.config.documents_dir);
    match ingest::ingest(&state.config, &state.embeddings, &state.store, &dir).await {
        Ok(summary) => Json(json!({
            "data": "successfully created index and loaded data",
            "summary": summary,
        }))
        .into_response(),
        Err(err) => internal_error(err),
    }
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.log.push_user(request.prompt);
    let messages = state.log.snapshot();

    match api::answer(&state.openai, &state.config, messages).await {
        Ok(text) if text.is_empty() => {
            Json(json!({ "generatedText": "<no text generated>" })).into_response()
        }
        Ok(text) => {
            state.log.push_assistant(text.clone());
            Json(json!({ "generatedText": text })).into_response()
        }
        Err(err) => internal_error(err),
    }
}

async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.log.reset();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_config(provider_base: &str, vector_base: &str) -> RagtagConfig {
        RagtagConfig {
            api_key: "test_api_key".to_string(),
            api_base: format!("{provider_base}/v1"),
            model: "test_model".to_string(),
            embedding_model: "test_embedding_model".to_string(),
            temperature: 0.9,
            vector_api_key: "test_vector_key".to_string(),
            vector_api_base: vector_base.to_string(),
            index_name: "test-index".to_string(),
            vector_dimension: 2,
            metric: "cosine".to_string(),
            top_k: 10,
            index_init_wait_ms: 0,
            chunk_size: 1000,
            documents_dir: "documents".to_string(),
            listen_addr: "127.0.0.1:0".to_string(),
        }
    }

    async fn spawn_app(config: RagtagConfig) -> String {
        let state = Arc::new(AppState::new(config, ChatTemplate::default_qa()).unwrap());
        let app = router(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn mock_embeddings(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "object": "list",
                        "data": [
                            { "object": "embedding", "embedding": [0.1, 0.2], "index": 0 },
                        ],
                        "model": "test_embedding_model",
                    }));
            })
            .await;
    }

    async fn mock_query_with_matches(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(POST).path("/indexes/test-index/query");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "matches": [
                            { "id": "a-0", "score": 0.9, "metadata": { "text": "alpha", "source": "a.txt" } },
                        ],
                    }));
            })
            .await;
    }

    fn sse_chunk(content: &str) -> String {
        format!(
            "data: {{\"id\":\"cmpl-1\",\"object\":\"chat.completion.chunk\",\"created\":0,\"model\":\"test_model\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{content}\"}},\"finish_reason\":null}}]}}\n\n"
        )
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start_async().await;
        let base = spawn_app(test_config(&server.base_url(), &server.base_url())).await;

        let response = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_chat_streams_tokens_in_order() {
        let server = MockServer::start_async().await;
        mock_embeddings(&server).await;
        mock_query_with_matches(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(format!(
                        "{}{}{}data: [DONE]\n\n",
                        sse_chunk("Hello"),
                        sse_chunk(", "),
                        sse_chunk("world")
                    ));
            })
            .await;

        let base = spawn_app(test_config(&server.base_url(), &server.base_url())).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{base}/api/chat"))
            .json(&serde_json::json!({
                "query": "say hello",
                "history": [
                    { "content": "hi", "author": "User" },
                    { "content": "hello!", "author": "AI" },
                ],
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert!(
            response
                .headers()
                .get("content-type")
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );

        let body = response.text().await.unwrap();
        assert_eq!(body, "Hello, world");
    }

    #[tokio::test]
    async fn test_chat_no_matches_is_500() {
        let server = MockServer::start_async().await;
        mock_embeddings(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/indexes/test-index/query");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({ "matches": [] }));
            })
            .await;

        let base = spawn_app(test_config(&server.base_url(), &server.base_url())).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{base}/api/chat"))
            .json(&serde_json::json!({ "query": "anything", "history": [] }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "no matches");
    }

    #[tokio::test]
    async fn test_chat_embedding_failure_is_500() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(500).body("embeddings fell over");
            })
            .await;

        let base = spawn_app(test_config(&server.base_url(), &server.base_url())).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{base}/api/chat"))
            .json(&serde_json::json!({ "query": "anything", "history": [] }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_chat_stream_error_aborts_body() {
        // A completion failure after the stream opens cannot rewrite the
        // status line; the body is aborted instead, as the original handler
        // aborts its writer.
        let server = MockServer::start_async().await;
        mock_embeddings(&server).await;
        mock_query_with_matches(&server).await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(500).body("model fell over");
            })
            .await;

        let base = spawn_app(test_config(&server.base_url(), &server.base_url())).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{base}/api/chat"))
            .json(&serde_json::json!({ "query": "anything", "history": [] }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert!(response.text().await.is_err());
    }

    #[tokio::test]
    async fn test_generate_uses_in_memory_log() {
        let server = MockServer::start_async().await;
        let completion = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "id": "cmpl-1",
                        "object": "chat.completion",
                        "created": 0,
                        "model": "test_model",
                        "choices": [
                            {
                                "index": 0,
                                "message": { "role": "assistant", "content": "a rhyme" },
                                "finish_reason": "stop",
                                "logprobs": null,
                            }
                        ],
                    }));
            })
            .await;

        let base = spawn_app(test_config(&server.base_url(), &server.base_url())).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/api/generate"))
            .json(&serde_json::json!({ "prompt": "write a rhyme" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["generatedText"], "a rhyme");
        completion.assert_async().await;

        let reset = client
            .post(format!("{base}/api/reset"))
            .send()
            .await
            .unwrap();
        assert_eq!(reset.status(), 204);
    }
}
