//! Corpus store data model: chunks, their embeddings, and metadata.

use serde::{Deserialize, Serialize};

/// One bounded substring of a source document paired with its embedding.
///
/// Immutable once created. Every chunk in a corpus carries an embedding of
/// the same length, fixed by the embedding model's output dimensionality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, embedding: Vec<f32>, metadata: ChunkMetadata) -> Self {
        Self {
            content: content.into(),
            embedding,
            metadata,
        }
    }
}

/// Provenance of an ingested chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_name: Option<String>,
    pub total_pages: Option<u32>,
    pub checksum: Option<String>,
    #[serde(default)]
    pub processed_at: String,
}

impl ChunkMetadata {
    /// Metadata for a document processed now.
    pub fn for_document(file_name: impl Into<String>, checksum: Option<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            total_pages: None,
            checksum,
            processed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// All ingested chunks for one corpus identifier, persisted as a single
/// serialized blob. Appends rewrite the whole blob; that is O(corpus size)
/// per mutation and is the accepted ceiling for this design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusStore {
    pub documents: Vec<Chunk>,
    pub created_at: String,
    pub updated_at: String,
}

impl CorpusStore {
    pub fn new() -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            documents: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Embedding length shared by all stored chunks, if any are stored.
    pub fn embedding_dimension(&self) -> Option<usize> {
        self.documents.first().map(|c| c.embedding.len())
    }
}

impl Default for CorpusStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The problem or topic the tutor is grounding its answer in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemContext {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Default for ProblemContext {
    fn default() -> Self {
        Self {
            id: "twosum".to_string(),
            title: "Two Sum".to_string(),
            description: "Find two numbers in an array that sum to a target value".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = CorpusStore::new();
        assert!(store.is_empty());
        assert_eq!(store.created_at, store.updated_at);
        assert!(store.embedding_dimension().is_none());
    }

    #[test]
    fn test_embedding_dimension() {
        let mut store = CorpusStore::new();
        store.documents.push(Chunk::new(
            "binary search",
            vec![0.1, 0.2, 0.3],
            ChunkMetadata::default(),
        ));
        assert_eq!(store.embedding_dimension(), Some(3));
    }

    #[test]
    fn test_store_serde_round_trip() {
        let mut store = CorpusStore::new();
        store.documents.push(Chunk::new(
            "hash maps",
            vec![1.0, 0.0],
            ChunkMetadata::for_document("lecture1.pdf", None),
        ));

        let json = serde_json::to_string(&store).unwrap();
        let parsed: CorpusStore = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.documents[0].content, "hash maps");
        assert_eq!(
            parsed.documents[0].metadata.file_name.as_deref(),
            Some("lecture1.pdf")
        );
    }
}
