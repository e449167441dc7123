//! Ingest command implementation.

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::output::{IngestStats, get_formatter};
use crate::error::IngestError;
use crate::models::{ChunkMetadata, Config, OutputFormat};
use crate::services::{CorpusStoreClient, EmbeddingClient, IngestPipeline, TextChunker};
use crate::utils::file::{calculate_checksum, read_file_content};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Text files to ingest into the corpus
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Corpus identifier the materials belong to (e.g. an assignment id)
    #[arg(long, short = 'c')]
    pub corpus: String,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let corpus_id = args.corpus.trim();
    if corpus_id.is_empty() {
        anyhow::bail!("corpus id cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();

    let pipeline = IngestPipeline::new(
        TextChunker::new(&config.chunking),
        Arc::new(EmbeddingClient::new(&config.embedding)?),
        Arc::new(CorpusStoreClient::new(&config.storage)),
    );

    let pb = ProgressBar::new(args.paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut stats = IngestStats {
        files_scanned: args.paths.len() as u64,
        ..Default::default()
    };

    for path in &args.paths {
        pb.inc(1);

        let content = match read_file_content(path, config.chunking.max_file_size) {
            Ok(c) => c,
            Err(e) => {
                if verbose {
                    pb.println(format!("Skipping {}: {}", path.display(), e));
                }
                stats.files_skipped += 1;
                continue;
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let metadata = ChunkMetadata::for_document(&file_name, Some(calculate_checksum(&content)));

        match pipeline.ingest_text(corpus_id, &content, metadata).await {
            Ok(stored) => {
                stats.files_ingested += 1;
                stats.chunks_stored += stored as u64;
            }
            Err(IngestError::NoTextExtracted) => {
                pb.println(format!(
                    "Skipping {}: no usable text (scanned document? try OCR or a text export)",
                    path.display()
                ));
                stats.files_skipped += 1;
            }
            Err(e) => {
                pb.finish_and_clear();
                return Err(anyhow::anyhow!("failed to ingest {}: {e}", path.display()));
            }
        }
    }

    pb.finish_and_clear();
    stats.duration_ms = start_time.elapsed().as_millis() as u64;
    print!("{}", formatter.format_ingest_stats(&stats));

    Ok(())
}
