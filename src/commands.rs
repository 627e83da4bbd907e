//! This module defines the command-line interface for the application using `clap`.
//!
//! It provides a `Cli` struct that represents the parsed command-line arguments,
//! and a `Commands` enum that represents the available subcommands and their
//! options.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Represents the parsed command-line arguments.
///
/// This struct is constructed by parsing the command-line arguments using `clap`.
/// It contains a `command` field that holds the parsed subcommand and its options.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, propagate_version = true, color = clap::ColorChoice::Always)]
pub struct Cli {
    /// Path to the configuration file. Defaults to `config.yaml` in the
    /// per-platform config directory.
    #[arg(long, env = "RAGTAG_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// The parsed subcommand and its options.
    #[command(subcommand)]
    pub command: Commands,
}

/// Represents the available subcommands and their options.
///
/// Each variant of this enum corresponds to a subcommand that the user can invoke
/// from the command line, along with any options specific to that subcommand.
#[derive(Subcommand, Debug)]
#[command(about, long_about = None, color = clap::ColorChoice::Always)]
pub enum Commands {
    /// The 'serve' subcommand: run the HTTP chat endpoint.
    #[clap(name = "serve", alias = "s")]
    Serve {
        /// Address to bind; overrides `listen_addr` from the config file.
        #[arg(name = "addr", short = 'a')]
        addr: Option<String>,
    },

    /// The 'ingest' subcommand: chunk, embed, and upsert local documents
    /// into the vector index.
    Ingest {
        /// Documents directory; overrides `documents_dir` from the config file.
        #[arg(name = "dir", short = 'd')]
        dir: Option<PathBuf>,
    },

    /// The 'ask' subcommand, which takes an optional question as an argument.
    ///
    /// If the question is not provided on the command line, a default question
    /// will be used.
    #[clap(name = "ask", alias = "a")]
    Ask {
        /// The question to be asked. If not provided, a default question is used.
        question: Option<String>,

        #[arg(name = "template", short = 't')]
        template: Option<String>,
    },

    /// The 'init' subcommand, which takes no arguments and is used for initialization.
    ///
    /// When invoked, this subcommand performs setup and initialization tasks, such
    /// as creating necessary directories and files.
    Init,
}
