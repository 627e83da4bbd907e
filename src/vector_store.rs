//! # VectorStore
//!
//! Client for the remote vector-index service.
//!
//! The index itself lives behind a hosted REST API; this module only speaks
//! that service's existing contract: list indexes, create an index (name,
//! dimensionality, distance metric), upsert vectors with chunk metadata, and
//! query the nearest neighbors of a vector. Ownership of the stored chunks
//! passes to the service at upsert time; nothing is mutated locally.
//!
//! ## Wire format
//! Request fields follow the service's camelCase convention (`topK`,
//! `includeMetadata`, `includeValues`), authentication is a per-request
//! `Api-Key` header, and query responses carry a ranked `matches` array of
//! `{id, score, values?, metadata?}`.
//!
//! ## Quick example
//! ```no_run
//! use ragtag::vector_store::VectorStore;
//!
//! # async fn run() -> Result<(), ragtag::BoxError> {
//! let store = VectorStore::new(
//!     "https://vectors.example.com".into(),
//!     "api-key".into(),
//!     "my-index".into(),
//! );
//! let response = store.query(&[0.0; 1536], 10).await?;
//! println!("{} matches", response.matches.len());
//! # Ok(()) }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::BoxError;

/// Client for a remote vector index.
#[derive(Debug, Clone)]
pub struct VectorStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Name of the index all data-plane operations target.
    pub index_name: String,
}

/// Metadata stored alongside each vector: the chunk text and its source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Raw chunk text, echoed back in query matches.
    pub text: String,
    /// Path of the document the chunk was split from.
    pub source: String,
}

/// A vector plus its id and metadata, as upserted into the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_values: bool,
    include_metadata: bool,
}

/// A single ranked match returned by a query.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    /// The stored vector, present when `includeValues` was set.
    #[serde(default)]
    pub values: Option<Vec<f32>>,
    /// The stored metadata, present when `includeMetadata` was set.
    #[serde(default)]
    pub metadata: Option<ChunkMetadata>,
}

/// The ranked result set of a nearest-neighbor query.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Vec<ScoredMatch>,
}

impl QueryResponse {
    /// Concatenate the metadata text of every match, joined by single spaces.
    ///
    /// This is the context string stuffed into the prompt; matches without
    /// metadata contribute nothing.
    pub fn concatenated_text(&self) -> String {
        self.matches
            .iter()
            .filter_map(|m| m.metadata.as_ref().map(|meta| meta.text.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl VectorStore {
    /// Create a client for the index service at `base_url`.
    pub fn new(base_url: String, api_key: String, index_name: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
            index_name,
        }
    }

    /// List the names of all indexes the service knows about.
    pub async fn list_indexes(&self) -> Result<Vec<String>, BoxError> {
        let url = format!("{}/databases", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("list indexes failed: {status}: {body}").into());
        }

        let names: Vec<String> = response.json().await?;
        Ok(names)
    }

    /// Create this client's index with the given dimensionality and metric.
    ///
    /// The service initializes indexes asynchronously; see [`ensure_index`]
    /// for the create-and-wait flow used by ingestion.
    ///
    /// [`ensure_index`]: VectorStore::ensure_index
    pub async fn create_index(&self, dimension: usize, metric: &str) -> Result<(), BoxError> {
        let url = format!("{}/databases", self.base_url);
        let request = CreateIndexRequest {
            name: &self.index_name,
            dimension,
            metric,
        };

        info!("Creating index \"{}\"...", self.index_name);

        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("create index failed: {status}: {body}").into());
        }

        Ok(())
    }

    /// Create the index if it does not already exist.
    ///
    /// After creating, waits `init_wait` for the service to finish
    /// initializing before returning. The service exposes no readiness
    /// signal to poll, so the wait is a fixed timeout.
    ///
    /// # Returns
    /// `true` if the index was created, `false` if it already existed.
    pub async fn ensure_index(
        &self,
        dimension: usize,
        metric: &str,
        init_wait: Duration,
    ) -> Result<bool, BoxError> {
        info!("Checking \"{}\"...", self.index_name);
        let existing = self.list_indexes().await?;

        if existing.iter().any(|name| name == &self.index_name) {
            info!("\"{}\" already exists.", self.index_name);
            return Ok(false);
        }

        self.create_index(dimension, metric).await?;
        info!(
            "Index created, waiting {:?} for it to finish initializing.",
            init_wait
        );
        tokio::time::sleep(init_wait).await;

        Ok(true)
    }

    /// Upsert a batch of vectors into the index.
    ///
    /// # Returns
    /// The number of vectors the service reports as upserted.
    pub async fn upsert(&self, vectors: &[VectorRecord]) -> Result<usize, BoxError> {
        let url = format!(
            "{}/indexes/{}/vectors/upsert",
            self.base_url, self.index_name
        );
        let request = UpsertRequest { vectors };

        debug!(
            "Upserting {} vectors into \"{}\"",
            vectors.len(),
            self.index_name
        );

        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("upsert failed: {status}: {body}").into());
        }

        let payload: UpsertResponse = response.json().await?;
        Ok(payload.upserted_count)
    }

    /// Query the index for the `top_k` nearest neighbors of `vector`.
    ///
    /// Matches are returned ranked by the service, with both stored values
    /// and metadata included.
    pub async fn query(&self, vector: &[f32], top_k: usize) -> Result<QueryResponse, BoxError> {
        let url = format!("{}/indexes/{}/query", self.base_url, self.index_name);
        let request = QueryRequest {
            vector,
            top_k,
            include_values: true,
            include_metadata: true,
        };

        debug!("Querying \"{}\" for top {}", self.index_name, top_k);

        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("query failed: {status}: {body}").into());
        }

        let payload: QueryResponse = response.json().await?;
        debug!("Found {} matches", payload.matches.len());
        Ok(payload)
    }
}
