//! Main module for the Ragtag CLI application.
//!
//! This module provides the main function and auxiliary functionalities for
//! the CLI application. It handles command parsing, configuration loading, and
//! initialization, as well as invoking the appropriate functionalities based on
//! the provided command-line arguments.
//!
//! # Examples
//!
//! Running the HTTP server:
//!
//! ```sh
//! cargo run -- serve
//! ragtag serve -a 0.0.0.0:8707
//! ```
//!
//! Ingesting documents and asking a question from the terminal:
//!
//! ```sh
//! ragtag ingest -d ./documents
//! ragtag ask "What do the documents say about onboarding?"
//! ```
//!
//! Initializing the application's configuration and templates:
//!
//! ```sh
//! cargo run -- init
//! ragtag init
//! ```

use clap::Parser;
use once_cell::sync::OnceCell;
use std::{fs, path::PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ragtag::{api, commands, config, config_dir, ingest, server, template};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), ragtag::BoxError> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())?;
    Ok(())
}

/// Main asynchronous function of the Ragtag CLI application.
///
/// Loads configuration, parses command-line arguments, and executes the
/// appropriate command.
///
/// # Errors
///
/// Returns an error if there is an issue loading the configuration, parsing the
/// command-line arguments, or executing the specified command.
async fn run() -> Result<(), ragtag::BoxError> {
    let cli = commands::Cli::parse();

    if let commands::Commands::Init = cli.command {
        debug!("Initializing configuration");
        return init();
    }

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_dir()?.join("config.yaml"),
    };

    debug!("Loading config from: {}", config_path.display());
    let ragtag_config = config::load_config(config_path.to_str().ok_or("Invalid config path")?)?;
    debug!("Config loaded: {:?}", ragtag_config);

    match cli.command {
        commands::Commands::Serve { addr } => {
            let template = template::load_template("qa")
                .unwrap_or_else(|_| template::ChatTemplate::default_qa());
            server::serve(ragtag_config, template, addr).await?;
        }
        commands::Commands::Ingest { dir } => {
            let dir =
                dir.unwrap_or_else(|| PathBuf::from(ragtag_config.documents_dir.clone()));
            let embeddings = ragtag::embeddings::EmbeddingsClient::new(
                ragtag_config.api_base.clone(),
                ragtag_config.api_key.clone(),
                ragtag_config.embedding_model.clone(),
            );
            let store = ragtag::vector_store::VectorStore::new(
                ragtag_config.vector_api_base.clone(),
                ragtag_config.vector_api_key.clone(),
                ragtag_config.index_name.clone(),
            );
            let summary = ingest::ingest(&ragtag_config, &embeddings, &store, &dir).await?;
            println!(
                "Ingested {} documents ({} chunks, {} upserted).",
                summary.documents, summary.chunks, summary.upserted
            );
        }
        commands::Commands::Ask { question, template } => {
            debug!("Asking question: {:?}", question);
            let template = match template {
                Some(name) => template::load_template(&name)?,
                None => template::load_template("qa")
                    .unwrap_or_else(|_| template::ChatTemplate::default_qa()),
            };
            let question = question.unwrap_or_else(|| "What is the meaning of life?".to_string());
            api::ask(&ragtag_config, question, &template).await?;
        }
        commands::Commands::Init => unreachable!("handled above"),
    }

    Ok(())
}

/// Initializes the application's configuration and templates.
///
/// Creates the necessary directories and files for the application's configuration and
/// default chat template. The configuration and template are stored in YAML format.
///
/// # Errors
///
/// Returns an error if there is an issue creating the directories or files, or
/// serializing the configuration and template to YAML.
fn init() -> Result<(), ragtag::BoxError> {
    let config_dir = config_dir()?;
    let path = config_dir.join("templates");
    info!("Creating template config directory: {}", path.display());
    fs::create_dir_all(path)?;

    let template_path = config_dir.join("templates/qa.yaml");
    info!("Creating template file: {}", template_path.display());
    let template = template::ChatTemplate::default_qa();
    let template_yaml = serde_yaml::to_string(&template)?;
    fs::write(template_path, template_yaml)?;

    let config_path = config_dir.join("config.yaml");
    info!("Creating config file: {}", config_path.display());
    let config = config::RagtagConfig {
        api_key: "CHANGEME".to_string(),
        api_base: "https://api.openai.com/v1".to_string(),
        model: "gpt-3.5-turbo".to_string(),
        embedding_model: "text-embedding-ada-002".to_string(),
        temperature: 0.9,
        vector_api_key: "CHANGEME".to_string(),
        vector_api_base: "https://vectors.example.com".to_string(),
        index_name: "ragtag-index".to_string(),
        vector_dimension: 1536,
        metric: "cosine".to_string(),
        top_k: 10,
        index_init_wait_ms: 60_000,
        chunk_size: 1000,
        documents_dir: "documents".to_string(),
        listen_addr: "127.0.0.1:8707".to_string(),
    };
    let config_yaml = serde_yaml::to_string(&config)?;
    fs::write(config_path, config_yaml)?;

    Ok(())
}
