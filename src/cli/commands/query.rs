//! Query command implementation.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat, QueryResults};
use crate::services::{ContextRetriever, CorpusStoreClient, EmbeddingClient};

#[derive(Debug, Args)]
pub struct QueryArgs {
    #[arg(required = true, help = "Query text")]
    pub query: String,

    /// Corpus identifier to search
    #[arg(long, short = 'c')]
    pub corpus: String,

    #[arg(long, short = 'n', help = "Maximum number of chunks to return")]
    pub limit: Option<u32>,

    #[arg(long, help = "Minimum similarity score threshold (0.0-1.0)")]
    pub min_score: Option<f32>,
}

pub async fn handle_query(args: QueryArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("query cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let limit = args.limit.unwrap_or(config.retrieval.top_k);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    let min_score = args.min_score.unwrap_or(config.retrieval.min_similarity);
    if !(0.0..=1.0).contains(&min_score) {
        anyhow::bail!("min_score must be between 0.0 and 1.0");
    }

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Corpus: {}", args.corpus);
        eprintln!("  Limit: {limit}");
        eprintln!("  Min score: {min_score:.3}");
    }

    let retriever = ContextRetriever::new(
        Arc::new(CorpusStoreClient::new(&config.storage)),
        Arc::new(EmbeddingClient::new(&config.embedding)?),
    );

    let chunks = retriever
        .query(&args.corpus, query, limit as usize, min_score)
        .await
        .context("context retrieval failed")?;

    let duration_ms = start_time.elapsed().as_millis() as u64;
    let results = QueryResults::new(args.corpus, query.to_string(), chunks, duration_ms);

    print!("{}", formatter.format_query_results(&results));

    Ok(())
}
