//! # Chat history
//!
//! Types for the browser-side chat transcript and a process-wide in-memory
//! message list.
//!
//! [`ChatItem`] is the JSON shape the front end posts alongside each
//! question: role, text, and a display flag for error bubbles. History is
//! rendered into the prompt as plain `HUMAN:`/`AI:` lines — the model sees a
//! transcript, not role-tagged messages.
//!
//! [`MessageLog`] backs the non-streaming `/api/generate` endpoint: a shared
//! message list that lives only as long as the process. That is an explicit
//! prototype shortcut, not a designed resource; nothing here is persisted.

use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent,
};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Who authored a chat item, in the front end's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    #[serde(rename = "AI")]
    Ai,
}

/// One message of the browser-side transcript.
///
/// Lives only in request memory; created on user submit or when a token
/// stream completes, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatItem {
    pub content: String,
    pub author: Author,
    /// Display flag: render this item as an error bubble.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

/// Render history as `HUMAN:`/`AI:` prefixed lines joined by newlines.
///
/// Error bubbles are presentation-only and are skipped.
pub fn render_history(history: &[ChatItem]) -> String {
    history
        .iter()
        .filter(|item| !item.is_error)
        .map(|item| match item.author {
            Author::Ai => format!("AI:{}", item.content),
            Author::User => format!("HUMAN:{}", item.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Process-wide, in-memory message list for the plain completion endpoint.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<ChatCompletionRequestMessage>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message.
    pub fn push_user(&self, content: String) {
        let message = ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(content),
            name: None,
        });
        self.messages.lock().unwrap().push(message);
    }

    /// Append an assistant message.
    pub fn push_assistant(&self, content: String) {
        let message =
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(content)),
                name: None,
                refusal: None,
                audio: None,
                tool_calls: None,
                function_call: None,
            });
        self.messages.lock().unwrap().push(message);
    }

    /// Clone the current message list, oldest first.
    pub fn snapshot(&self) -> Vec<ChatCompletionRequestMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Drop every message.
    pub fn reset(&self) {
        self.messages.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
