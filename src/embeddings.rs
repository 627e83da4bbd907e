//! # Embeddings client
//!
//! Thin client for the OpenAI-compatible `/embeddings` endpoint. Text goes
//! in, dense vectors come out; the model itself is entirely the provider's
//! business.
//!
//! Responses are re-ordered by the provider's `index` field before being
//! returned, so position `i` of the output always holds the embedding of
//! input `i`. That pairing is the only invariant this module owns.
//!
//! ## Quick example
//! ```no_run
//! use ragtag::embeddings::EmbeddingsClient;
//!
//! # async fn run() -> Result<(), ragtag::BoxError> {
//! let client = EmbeddingsClient::new(
//!     "https://api.openai.com/v1".into(),
//!     "sk-...".into(),
//!     "text-embedding-ada-002".into(),
//! );
//! let vector = client.embed_one("What is a vector index?").await?;
//! assert!(!vector.is_empty());
//! # Ok(()) }
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::BoxError;

/// Client for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct EmbeddingsClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingsClient {
    /// Create a client for `{api_base}/embeddings` using a bearer API key.
    pub fn new(api_base: String, api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            api_key,
            model,
        }
    }

    /// Embed a batch of texts.
    ///
    /// # Parameters
    /// - `inputs`: Texts to embed; the provider accepts a batch per request.
    ///
    /// # Returns
    /// One vector per input, in input order.
    ///
    /// # Errors
    /// - Non-success HTTP statuses are surfaced with the response body.
    /// - A response with a different number of embeddings than inputs is an
    ///   error (the chunk↔embedding pairing would be broken).
    pub async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, BoxError> {
        let url = format!("{}/embeddings", self.api_base);
        let request = EmbeddingsRequest {
            model: &self.model,
            input: inputs,
        };

        debug!("Embedding {} inputs with {}", inputs.len(), self.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("embeddings request failed: {status}: {body}").into());
        }

        let payload: EmbeddingsResponse = response.json().await?;

        if payload.data.len() != inputs.len() {
            return Err(format!(
                "embeddings response length mismatch: {} inputs, {} embeddings",
                inputs.len(),
                payload.data.len()
            )
            .into());
        }

        // Re-order by the provider's index field so outputs stay paired with inputs.
        let mut data = payload.data;
        data.sort_by_key(|e| e.index);

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, BoxError> {
        let embeddings = self.embed(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| "embeddings response was empty".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> EmbeddingsClient {
        EmbeddingsClient::new(
            format!("{}/v1", server.base_url()),
            "test-key".to_string(),
            "text-embedding-ada-002".to_string(),
        )
    }

    #[tokio::test]
    async fn test_embed_sends_model_and_inputs() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/embeddings")
                    .header("authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "text-embedding-ada-002",
                        "input": ["hello", "world"],
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "object": "list",
                        "data": [
                            { "object": "embedding", "embedding": [0.1, 0.2], "index": 0 },
                            { "object": "embedding", "embedding": [0.3, 0.4], "index": 1 },
                        ],
                        "model": "text-embedding-ada-002",
                    }));
            })
            .await;

        let client = client_for(&server);
        let embeddings = client
            .embed(&["hello".to_string(), "world".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(embeddings, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn test_embed_reorders_by_index() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "object": "list",
                        "data": [
                            { "object": "embedding", "embedding": [0.3, 0.4], "index": 1 },
                            { "object": "embedding", "embedding": [0.1, 0.2], "index": 0 },
                        ],
                        "model": "text-embedding-ada-002",
                    }));
            })
            .await;

        let client = client_for(&server);
        let embeddings = client
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        // Out-of-order provider responses still pair embedding i with input i.
        assert_eq!(embeddings[0], vec![0.1, 0.2]);
        assert_eq!(embeddings[1], vec![0.3, 0.4]);
    }

    #[tokio::test]
    async fn test_embed_surfaces_provider_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(500).body("upstream exploded");
            })
            .await;

        let client = client_for(&server);
        let result = client.embed_one("boom").await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_embed_length_mismatch_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/embeddings");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "object": "list",
                        "data": [],
                        "model": "text-embedding-ada-002",
                    }));
            })
            .await;

        let client = client_for(&server);
        let result = client.embed(&["only input".to_string()]).await;
        assert!(result.is_err());
    }
}
