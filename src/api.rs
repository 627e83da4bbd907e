//! # API Module
//!
//! This module handles the retrieval-augmented answer flow: embed the
//! question, query the vector index for nearest chunks, assemble a prompt
//! containing that context plus the conversation history, and request a
//! chat completion — streamed or whole.
//!
//! Everything here is a sequential chain of provider calls; the only logic
//! is prompt assembly (string concatenation) and forwarding stream events.
//!
//! # Example
//!
//! ```no_run
//! use ragtag::api::ask;
//! use ragtag::config::load_config;
//! use ragtag::template::ChatTemplate;
//!
//! # async fn run() -> Result<(), ragtag::BoxError> {
//! let config = load_config("/path/to/config.yaml")?;
//! let template = ChatTemplate::default_qa();
//! let answer = ask(&config, "What is the meaning of life?".into(), &template).await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```

use crate::{
    BoxError,
    config::RagtagConfig,
    embeddings::EmbeddingsClient,
    template::ChatTemplate,
    vector_store::VectorStore,
};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequestArgs,
    },
};
use crossterm::{
    ExecutableCommand,
    style::{Attribute, Color, SetAttribute, SetForegroundColor},
};
use futures::{Stream, StreamExt};
use std::io::{Write, stdout};
use std::pin::Pin;
use tracing::{debug, error};

/// Stream of answer token deltas, as forwarded from the provider.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<String, OpenAIError>> + Send>>;

/// Creates a new chat-completion API client from configuration.
///
/// # Parameters
/// - `config: &RagtagConfig`: Configuration containing API base and key.
///
/// # Returns
/// - `Result<Client<OpenAIConfig>, BoxError>`: Created client or an error if
///   initialization fails.
pub fn create_client(config: &RagtagConfig) -> Result<Client<OpenAIConfig>, BoxError> {
    let openai_config = OpenAIConfig::new()
        .with_api_key(config.api_key.clone())
        .with_api_base(config.api_base.clone());
    debug!("Client created with config: {:?}", openai_config);
    Ok(Client::with_config(openai_config))
}

/// Assemble the role-tagged message list for one question.
///
/// The system message concatenates the template instructions with the
/// rendered chat history and the retrieved context; the question itself is
/// sent as a user message. Template seed messages sit in between.
pub fn build_messages(
    template: &ChatTemplate,
    history: &str,
    context: &str,
    question: &str,
) -> Vec<ChatCompletionRequestMessage> {
    let system_content = format!(
        "{}\n\n\
         ===============\n\
         CHAT HISTORY:\n\
         {}\n\
         ===============\n\
         RELEVANT DOCUMENTS:\n\
         {}\n\
         ===============\n",
        template.system_prompt, history, context
    );

    let mut messages = vec![ChatCompletionRequestMessage::System(
        ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(system_content),
            name: None,
        },
    )];

    messages.extend(template.messages.iter().cloned());

    messages.push(ChatCompletionRequestMessage::User(
        ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(question.to_string()),
            name: None,
        },
    ));

    messages
}

/// Embed the question and fetch the concatenated text of its nearest chunks.
///
/// # Parameters
/// - `embeddings`: Client for the embeddings endpoint.
/// - `store`: Client for the vector index.
/// - `question`: The user's question.
/// - `top_k`: Number of neighbors to request.
///
/// # Errors
/// An empty match set is the specific error `"no matches"`; provider
/// failures pass through unchanged.
pub async fn retrieve_context(
    embeddings: &EmbeddingsClient,
    store: &VectorStore,
    question: &str,
    top_k: usize,
) -> Result<String, BoxError> {
    let vector = embeddings.embed_one(question).await?;
    let response = store.query(&vector, top_k).await?;

    debug!("Found {} matches", response.matches.len());

    if response.matches.is_empty() {
        return Err("no matches".into());
    }

    Ok(response.concatenated_text())
}

/// Request a streamed chat completion and yield its token deltas.
///
/// The returned stream forwards provider events in arrival order: each item
/// is the text delta of one event (empty deltas included as empty strings),
/// and the stream ends exactly once, when the provider signals completion.
/// Provider errors surface as `Err` items.
pub async fn answer_stream(
    client: &Client<OpenAIConfig>,
    config: &RagtagConfig,
    messages: Vec<ChatCompletionRequestMessage>,
) -> Result<AnswerStream, BoxError> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(config.model.clone())
        .temperature(config.temperature)
        .messages(messages)
        .build()?;

    debug!("Sending streaming request: {:?}", request);

    let stream = client.chat().create_stream(request).await?;

    Ok(Box::pin(stream.map(|event| {
        event.map(|response| {
            response
                .choices
                .iter()
                .filter_map(|chat_choice| chat_choice.delta.content.clone())
                .collect::<String>()
        })
    })))
}

/// Request a whole (non-streaming) chat completion.
pub async fn answer(
    client: &Client<OpenAIConfig>,
    config: &RagtagConfig,
    messages: Vec<ChatCompletionRequestMessage>,
) -> Result<String, BoxError> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(config.model.clone())
        .temperature(config.temperature)
        .messages(messages)
        .build()?;

    debug!("Sending request: {:?}", request);

    let response = client.chat().create(request).await?;

    let mut response_string = String::new();
    response.choices.iter().for_each(|chat_choice| {
        if let Some(message_text) = chat_choice.message.content.clone() {
            response_string.push_str(&message_text);
        }
    });

    Ok(response_string)
}

/// Asks a single question through the full retrieval flow and streams the
/// answer to the terminal.
///
/// # Parameters
/// - `config: &RagtagConfig`: Configuration for the provider clients.
/// - `question: String`: The user's input question.
/// - `template: &ChatTemplate`: Template used to construct the system prompt.
///
/// # Returns
/// - `Result<String, BoxError>`: The accumulated answer text, or an error.
pub async fn ask(
    config: &RagtagConfig,
    question: String,
    template: &ChatTemplate,
) -> Result<String, BoxError> {
    let client = create_client(config)?;
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

    let context = retrieve_context(&embeddings, &store, &question, config.top_k).await?;
    let messages = build_messages(template, "", &context, &question);

    let mut stream = answer_stream(&client, config, messages).await?;

    let mut response_string = String::new();
    let mut stdout = stdout();
    stdout.execute(SetForegroundColor(Color::Blue))?;
    stdout.execute(SetAttribute(Attribute::Bold))?;

    while let Some(result) = stream.next().await {
        match result {
            Ok(token) => {
                response_string.push_str(&token);
                write!(stdout, "{token}")?;
            }
            Err(err) => {
                error!("Received error: {}", err);
                writeln!(stdout, "error: {err}")?;
            }
        }
        stdout.flush()?;
    }

    stdout.execute(SetAttribute(Attribute::Reset))?;
    stdout.execute(SetForegroundColor(Color::Reset))?;
    writeln!(stdout)?;

    Ok(response_string)
}
