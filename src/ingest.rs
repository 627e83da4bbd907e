//! # Document ingestion
//!
//! Reads local text files, splits them into fixed-size chunks, embeds each
//! chunk, and upserts the vectors into the remote index.
//!
//! Splitting is the one piece of logic that lives entirely here: chunks are
//! at most `chunk_size` characters, never overlap, and prefer to break at a
//! paragraph, newline, or space inside the window before falling back to a
//! hard cut at a character boundary.
//!
//! Record ids are derived from the source path (`sha256(source)-<i>`), so
//! re-ingesting a file overwrites its chunks in place instead of
//! accumulating duplicates.

use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::BoxError;
use crate::config::RagtagConfig;
use crate::embeddings::EmbeddingsClient;
use crate::vector_store::{ChunkMetadata, VectorRecord, VectorStore};

/// A document read from disk, prior to splitting.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path the text was loaded from, kept as chunk metadata.
    pub source: String,
    /// Full file contents.
    pub text: String,
}

/// Counts reported after an ingestion run.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct IngestSummary {
    pub documents: usize,
    pub chunks: usize,
    pub upserted: usize,
}

/// Recursively load every `.txt` file under `dir`.
///
/// Files are returned in path-sorted order so ingestion runs are
/// deterministic.
///
/// # Errors
/// Propagates I/O errors from directory traversal and file reads. A file
/// that is not valid UTF-8 is an error, not a skip.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>, BoxError> {
    let mut documents = Vec::new();
    collect_documents(dir, &mut documents)?;
    documents.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(documents)
}

fn collect_documents(dir: &Path, documents: &mut Vec<Document>) -> Result<(), BoxError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_documents(&path, documents)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("txt") {
            let text = fs::read_to_string(&path)?;
            documents.push(Document {
                source: path.to_string_lossy().into_owned(),
                text,
            });
        }
    }
    Ok(())
}

/// Split `text` into chunks of at most `chunk_size` characters, no overlap.
///
/// Within each window the split prefers, in order: the last paragraph break
/// (`\n\n`), the last newline, the last space. If the window contains none
/// of these, the text is cut at the `chunk_size`-th character boundary.
/// Chunks are trimmed of surrounding whitespace and never empty.
///
/// # Panics
/// Never; `chunk_size` of zero is treated as one.
pub fn split_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        // Byte offset of the first character past the window, if any.
        let hard_cut = match rest.char_indices().nth(chunk_size) {
            Some((byte_idx, _)) => byte_idx,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };

        let window = &rest[..hard_cut];
        let cut = window
            .rfind("\n\n")
            .or_else(|| window.rfind('\n'))
            .or_else(|| window.rfind(' '))
            .filter(|&idx| idx > 0)
            .unwrap_or(hard_cut);

        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            chunks.push(head.to_string());
        }
        rest = tail.trim_start();
    }

    chunks
}

/// Split a document's chunks into upsert-ready records with embeddings.
fn records_for(source: &str, chunks: &[String], embeddings: Vec<Vec<f32>>) -> Vec<VectorRecord> {
    let source_digest = sha256::digest(source);
    chunks
        .iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (chunk, values))| VectorRecord {
            id: format!("{}-{}", source_digest, i),
            values,
            metadata: ChunkMetadata {
                text: chunk.clone(),
                source: source.to_string(),
            },
        })
        .collect()
}

/// Run the full ingestion flow for the configured documents directory.
///
/// Ensures the index exists (creating it with the configured dimensionality
/// and metric, then waiting out the service's initialization window), then
/// for each document: split, embed the chunk batch, upsert.
///
/// # Errors
/// The first failing provider call aborts the run; there is no retry or
/// partial-result recovery.
pub async fn ingest(
    config: &RagtagConfig,
    embeddings: &EmbeddingsClient,
    store: &VectorStore,
    dir: &Path,
) -> Result<IngestSummary, BoxError> {
    let documents = load_documents(dir)?;
    info!("Loaded {} documents from {}", documents.len(), dir.display());

    store
        .ensure_index(
            config.vector_dimension,
            &config.metric,
            Duration::from_millis(config.index_init_wait_ms),
        )
        .await?;

    let mut summary = IngestSummary {
        documents: documents.len(),
        ..IngestSummary::default()
    };

    for document in &documents {
        info!("Processing document: {}", document.source);

        let chunks = split_text(&document.text, config.chunk_size);
        info!("Text split into {} chunks", chunks.len());

        if chunks.is_empty() {
            continue;
        }

        let vectors = embeddings.embed(&chunks).await?;
        let records = records_for(&document.source, &chunks, vectors);

        summary.chunks += records.len();
        summary.upserted += store.upsert(&records).await?;
    }

    info!(
        "Ingest complete: {} documents, {} chunks, {} upserted",
        summary.documents, summary.chunks, summary.upserted
    );

    Ok(summary)
}
