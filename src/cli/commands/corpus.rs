//! Corpus management commands.

use anyhow::Result;
use clap::Subcommand;

use crate::cli::output::{CorpusStatus, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::CorpusStoreClient;

#[derive(Debug, Subcommand)]
pub enum CorpusCommand {
    /// Show corpus contents and metadata
    Status {
        /// Corpus identifier
        #[arg(required = true)]
        corpus: String,
    },

    /// Delete a corpus and everything ingested into it
    Delete {
        /// Corpus identifier
        #[arg(required = true)]
        corpus: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        force: bool,
    },
}

pub async fn handle_corpus(cmd: CorpusCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    match cmd {
        CorpusCommand::Status { corpus } => handle_status(&corpus, format).await,
        CorpusCommand::Delete { corpus, force } => handle_delete(&corpus, force, format).await,
    }
}

async fn handle_status(corpus_id: &str, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let client = CorpusStoreClient::new(&config.storage);

    let path = client.corpus_path(corpus_id)?.display().to_string();

    let status = match client.load(corpus_id).await? {
        Some(store) => CorpusStatus {
            corpus_id: corpus_id.to_string(),
            exists: true,
            chunks: store.len() as u64,
            embedding_dimension: store.embedding_dimension(),
            created_at: Some(store.created_at),
            updated_at: Some(store.updated_at),
            path,
        },
        None => CorpusStatus {
            corpus_id: corpus_id.to_string(),
            exists: false,
            chunks: 0,
            embedding_dimension: None,
            created_at: None,
            updated_at: None,
            path,
        },
    };

    print!("{}", formatter.format_corpus_status(&status));
    Ok(())
}

async fn handle_delete(corpus_id: &str, force: bool, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let client = CorpusStoreClient::new(&config.storage);

    if !client.exists(corpus_id).await {
        println!(
            "{}",
            formatter.format_message(&format!("Corpus '{corpus_id}' does not exist."))
        );
        return Ok(());
    }

    if !force {
        println!("This will delete all materials ingested into '{corpus_id}'. Continue? [y/N]");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.format_message("Aborted."));
            return Ok(());
        }
    }

    client.delete(corpus_id).await?;
    println!(
        "{}",
        formatter.format_message(&format!("Deleted corpus '{corpus_id}'."))
    );
    Ok(())
}
