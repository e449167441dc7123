//! Ingestion pipeline: document text to embedded, persisted chunks.

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::IngestError;
use crate::models::{Chunk, ChunkMetadata};
use crate::services::chunker::TextChunker;
use crate::services::embedding::EmbeddingClient;
use crate::services::store::CorpusStoreClient;

/// Ingests extracted document text into a corpus.
#[derive(Clone)]
pub struct IngestPipeline {
    chunker: TextChunker,
    embedding: Arc<EmbeddingClient>,
    store: Arc<CorpusStoreClient>,
}

impl IngestPipeline {
    pub fn new(
        chunker: TextChunker,
        embedding: Arc<EmbeddingClient>,
        store: Arc<CorpusStoreClient>,
    ) -> Self {
        Self {
            chunker,
            embedding,
            store,
        }
    }

    /// Chunk, embed, and append one document's text to the corpus.
    ///
    /// Returns the number of chunks stored. Text that is empty after
    /// trimming fails with [`IngestError::NoTextExtracted`] so the caller
    /// can suggest OCR or another format.
    pub async fn ingest_text(
        &self,
        corpus_id: &str,
        text: &str,
        metadata: ChunkMetadata,
    ) -> Result<usize, IngestError> {
        if text.trim().is_empty() {
            return Err(IngestError::NoTextExtracted);
        }

        let chunks = self.chunker.chunk(text);
        self.ingest_chunks(corpus_id, chunks, metadata).await
    }

    /// Embed already-chunked text and append it to the corpus.
    ///
    /// Each chunk embeds independently; a chunk whose embedding call fails
    /// is skipped with a warning and the rest continue. If every chunk
    /// fails, the last embedding error propagates instead of silently
    /// storing nothing.
    pub async fn ingest_chunks(
        &self,
        corpus_id: &str,
        chunks: Vec<String>,
        metadata: ChunkMetadata,
    ) -> Result<usize, IngestError> {
        if chunks.is_empty() {
            return Err(IngestError::NoTextExtracted);
        }
        let total = chunks.len();

        let mut embedded = Vec::with_capacity(total);
        let mut last_error = None;
        for (i, content) in chunks.into_iter().enumerate() {
            match self.embedding.embed(&content).await {
                Ok(vector) => {
                    embedded.push(Chunk::new(content, vector, metadata.clone()));
                }
                Err(e) => {
                    warn!(corpus_id, chunk = i, error = %e, "skipping chunk; embedding failed");
                    last_error = Some(e);
                }
            }
        }

        if embedded.is_empty() {
            if let Some(e) = last_error {
                return Err(IngestError::Embedding(e));
            }
            return Err(IngestError::NoTextExtracted);
        }

        let stored = embedded.len();
        self.store.append(corpus_id, embedded).await?;
        info!(
            corpus_id,
            stored,
            skipped = total - stored,
            "document ingested"
        );
        Ok(stored)
    }

    /// How many chunks the configured chunker would produce for this text.
    pub fn plan_chunks(&self, text: &str) -> Vec<String> {
        self.chunker.chunk(text)
    }
}
