//! This module provides functionality for loading and handling the application's configuration.
//!
//! It defines the `RagtagConfig` struct, which holds the configuration parameters,
//! and a `load_config` function to load the configuration from a file.
//!
//! # Examples
//!
//! Loading the configuration from a file:
//!
//! ```no_run
//! use ragtag::config::{RagtagConfig, load_config};
//!
//! let config_file_path = "/path/to/config.yaml";
//! let config: RagtagConfig = load_config(config_file_path).unwrap();
//! println!("{:?}", config);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;

use crate::BoxError;

/// Represents the application's configuration.
///
/// This struct holds everything needed to talk to the chat-completion API,
/// the embeddings API, and the remote vector index, plus the ingestion and
/// server settings. It is constructed by loading a YAML configuration file
/// with [`load_config`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct RagtagConfig {
    /// The API key used to authenticate requests to the chat/embeddings API.
    pub api_key: String,

    /// The base URL of the OpenAI-compatible API (e.g. `https://api.openai.com/v1`).
    pub api_base: String,

    /// The name of the model used for generating answers.
    pub model: String,

    /// The name of the model used for embedding text.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature for answer generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// The API key for the vector-index service.
    pub vector_api_key: String,

    /// The base URL of the vector-index service.
    pub vector_api_base: String,

    /// Name of the index holding the document chunks.
    pub index_name: String,

    /// Dimensionality of the embedding vectors stored in the index.
    #[serde(default = "default_vector_dimension")]
    pub vector_dimension: usize,

    /// Distance metric used when the index is created.
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Number of nearest neighbors requested per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// How long to wait after creating an index before it is usable.
    #[serde(default = "default_index_init_wait_ms")]
    pub index_init_wait_ms: u64,

    /// Maximum chunk size, in characters, for document splitting.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Directory of `.txt` documents to ingest.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,

    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_temperature() -> f32 {
    0.9
}

fn default_vector_dimension() -> usize {
    1536
}

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_index_init_wait_ms() -> u64 {
    60_000
}

fn default_chunk_size() -> usize {
    1000
}

fn default_documents_dir() -> String {
    "documents".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8707".to_string()
}

/// Loads the application's configuration from a YAML file.
///
/// This function reads the file at the given path, parses it as YAML, and
/// constructs a `RagtagConfig` struct from it. Fields with defaults
/// (`temperature`, `top_k`, `chunk_size`, ...) may be omitted from the file.
///
/// # Parameters
///
/// - `file`: The path to the YAML configuration file.
///
/// # Returns
///
/// - `Ok(RagtagConfig)`: The loaded configuration.
/// - `Err(BoxError)`: An error occurred while reading the file or parsing the YAML.
///
/// # Examples
///
/// ```no_run
/// use ragtag::config::load_config;
///
/// let config_file_path = "/path/to/config.yaml";
/// match load_config(config_file_path) {
///     Ok(config) => println!("{:?}", config),
///     Err(err) => eprintln!("Error loading config: {}", err),
/// }
/// ```
pub fn load_config(file: &str) -> Result<RagtagConfig, BoxError> {
    tracing::debug!("Loading config: {}", file);
    let content = fs::read_to_string(file)?;
    let config: RagtagConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}
