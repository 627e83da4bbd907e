//! # Template loading and structure
//!
//! Utilities for defining and loading **chat templates** used by Ragtag.
//!
//! A template is a small YAML document that specifies:
//! - a `system_prompt` that steers how retrieved context is used,
//! - an ordered list of seed `messages` (serialized
//!   [`async_openai::types::ChatCompletionRequestMessage`]) inserted between
//!   the system scaffold and the live question.
//!
//! Templates are stored per-user under the application's configuration
//! directory, inside a `templates/` subfolder. The loader resolves templates
//! at:
//!
//! ```text
//! <config_dir>/templates/<name>.yaml
//! ```
//!
//! where `<config_dir>` is provided by [`crate::config_dir()`].
//!
//! ## Minimal YAML example
//!
//! ```yaml
//! # ~/.config/ragtag/templates/qa.yaml
//! system_prompt: "Use the following pieces of context to answer the user's question."
//! messages: []
//! ```
//!
//! When no template file exists, callers fall back to
//! [`ChatTemplate::default_qa`], which carries the built-in
//! question-answering instructions.

use async_openai::types::chat::ChatCompletionRequestMessage;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::BoxError;

/// A reusable chat template.
///
/// Instances are typically created by deserializing YAML files with
/// [`load_template`], or via [`ChatTemplate::default_qa`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatTemplate {
    /// Instructions that precede the retrieved context and history in the
    /// session's system message.
    pub system_prompt: String,

    /// Seed messages that precede the live question.
    #[serde(default)]
    pub messages: Vec<ChatCompletionRequestMessage>,
}

impl ChatTemplate {
    /// The built-in question-answering template.
    ///
    /// Instructs the model to answer from the supplied context and to admit
    /// ignorance rather than invent an answer.
    pub fn default_qa() -> Self {
        ChatTemplate {
            system_prompt: "Use the following pieces of context to answer the user's question. \
                            If you don't know the answer, just say that you don't know, don't \
                            try to make up an answer."
                .to_string(),
            messages: vec![],
        }
    }
}

/// Load a chat template by name from the user's config directory.
///
/// Resolves `<config_dir>/templates/<name>.yaml`, reads the file, and
/// deserializes into a [`ChatTemplate`].
///
/// ### Errors
/// Returns an error if:
/// - the config directory cannot be determined,
/// - the template file does not exist or cannot be read,
/// - the YAML content cannot be deserialized into a `ChatTemplate`.
pub fn load_template(name: &str) -> Result<ChatTemplate, BoxError> {
    let templates_dir = crate::config_dir()?.join("templates");
    load_template_from(&templates_dir, name)
}

/// Load a chat template by name from an explicit templates directory.
pub fn load_template_from(dir: &Path, name: &str) -> Result<ChatTemplate, BoxError> {
    let path = dir.join(format!("{}.yaml", name));

    tracing::info!("Loading template: {}", path.display());

    let content = fs::read_to_string(path)?;
    let template: ChatTemplate = serde_yaml::from_str(&content)?;
    Ok(template)
}
