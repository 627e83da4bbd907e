//! # Ragtag (library root)
//!
//! This crate provides the core plumbing for the **Ragtag** RAG chat prototype:
//! - Chat-completion API bindings and answer orchestration (`api`).
//! - Remote vector-index and embeddings clients (`vector_store`, `embeddings`).
//! - Document loading, chunking, and upserting (`ingest`).
//! - Browser-side chat message types & in-memory history (`history`).
//! - The HTTP endpoint that streams answers token-by-token (`server`).
//! - CLI parsing & commands (`commands`), configuration (`config`), and
//!   prompt/template handling (`template`).
//!
//! The pipeline is deliberately simple: embed the question, fetch the nearest
//! document chunks from the remote index, concatenate their text into the
//! prompt together with the conversation history, and stream the model's
//! answer back. Every substantive operation is a call into a hosted service;
//! there is no retry, persistence, or caching layer here.
//!
//! ## Configuration layout
//! Configuration and templates live under the per-platform config directory
//! returned by [`config_dir`], e.g.:
//!
//! - macOS: `~/Library/Application Support/com.ragtag.ragtag`
//! - Linux (XDG): `~/.config/ragtag`
//! - Windows: `C:\Users\<you>\AppData\Roaming\ragtag\ragtag`
//!
//! Run `ragtag init` to scaffold `config.yaml` and `templates/qa.yaml`.
//!
//! ## Modules
//! - [`api`], [`commands`], [`config`], [`embeddings`], [`history`],
//!   [`ingest`], [`server`], [`template`], [`vector_store`]

use directories::ProjectDirs;
use std::error::Error;

pub mod api;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod history;
pub mod ingest;
pub mod server;
pub mod template;
pub mod vector_store;

/// Boxed error type used throughout the crate.
///
/// `Send + Sync` so errors can cross task boundaries inside the HTTP server.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Return the per-platform configuration directory used by Ragtag.
///
/// This uses [`directories::ProjectDirs`] with the application triple
/// `("com", "ragtag", "ragtag")`, so you get the right place on each OS.
///
/// The directory is **not** created by this function; callers that need it
/// should create it with `fs::create_dir_all`.
///
/// # Errors
/// Returns an error if the platform configuration directory cannot be
/// determined (rare, but possible in heavily sandboxed environments).
///
/// # Examples
/// ```rust
/// let cfg = ragtag::config_dir().expect("has a config dir");
/// println!("config at {}", cfg.display());
/// ```
pub fn config_dir() -> Result<std::path::PathBuf, BoxError> {
    let proj_dirs = ProjectDirs::from("com", "ragtag", "ragtag")
        .ok_or("Unable to determine config directory")?;
    let config_dir = proj_dirs.config_dir().to_path_buf();

    Ok(config_dir)
}
