//! CLI module for the RAG tutoring core.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Retrieval-grounded tutoring assistant: ingest course materials, search
/// them, and stream grounded answers.
#[derive(Debug, Parser)]
#[command(name = "ragtutor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest course material files into a corpus
    Ingest(commands::IngestArgs),

    /// Retrieve the most similar chunks for a query
    Query(commands::QueryArgs),

    /// Ask the tutor a question and stream the answer
    Ask(commands::AskArgs),

    /// Manage corpora
    #[command(subcommand)]
    Corpus(commands::CorpusCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

// FromStr for OutputFormat is implemented in models::query
