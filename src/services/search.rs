//! Similarity search over a corpus: brute-force cosine ranking.

use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::QueryError;
use crate::models::CorpusStore;
use crate::services::{CorpusStoreClient, EmbeddingClient};

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// A zero-magnitude vector has no direction; its similarity to anything is
/// defined as 0 rather than a division-by-zero NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

/// Rank stored chunks against a query embedding.
///
/// Linear scan over every chunk; fine at hundreds to low thousands of
/// chunks, the known ceiling of this design. The sort is stable, so equal
/// scores keep insertion order.
///
/// A query embedding whose length differs from the corpus's dimensionality
/// (a different embedding model, usually) returns nothing: truncated dot
/// products would rank chunks on meaningless scores.
pub fn rank_chunks(
    store: &CorpusStore,
    query_embedding: &[f32],
    top_k: usize,
    min_similarity: f32,
) -> Vec<String> {
    if let Some(expected) = store.embedding_dimension()
        && expected != query_embedding.len()
    {
        warn!(
            expected,
            actual = query_embedding.len(),
            "query embedding dimension differs from stored chunks; returning nothing"
        );
        return Vec::new();
    }

    let mut scored: Vec<(f32, &str)> = store
        .documents
        .iter()
        .map(|chunk| {
            (
                cosine_similarity(query_embedding, &chunk.embedding),
                chunk.content.as_str(),
            )
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .filter(|(score, _)| *score >= min_similarity)
        .take(top_k)
        .map(|(_, content)| content.to_string())
        .collect()
}

/// Retrieves grounding context for a query against one corpus.
#[derive(Clone)]
pub struct ContextRetriever {
    store: Arc<CorpusStoreClient>,
    embedding: Arc<EmbeddingClient>,
}

impl ContextRetriever {
    pub fn new(store: Arc<CorpusStoreClient>, embedding: Arc<EmbeddingClient>) -> Self {
        Self { store, embedding }
    }

    /// Return the top-K most similar chunk contents for the query text.
    ///
    /// An absent or empty corpus yields an empty result, never an error:
    /// "no context available" is an expected state for callers.
    pub async fn query(
        &self,
        corpus_id: &str,
        query_text: &str,
        top_k: usize,
        min_similarity: f32,
    ) -> Result<Vec<String>, QueryError> {
        let Some(store) = self.store.load(corpus_id).await? else {
            debug!(corpus_id, "no corpus store; returning empty context");
            return Ok(Vec::new());
        };
        if store.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedding.embed(query_text).await?;
        let results = rank_chunks(&store, &query_embedding, top_k, min_similarity);
        debug!(
            corpus_id,
            candidates = store.len(),
            returned = results.len(),
            "context retrieved"
        );
        Ok(results)
    }

    /// Like [`Self::query`], but swallows failures into an empty context.
    ///
    /// The answer path treats retrieval as best-effort: a broken store or
    /// embedding endpoint degrades to the no-materials prompt instead of
    /// failing the whole request.
    pub async fn query_or_empty(
        &self,
        corpus_id: &str,
        query_text: &str,
        top_k: usize,
        min_similarity: f32,
    ) -> Vec<String> {
        match self.query(corpus_id, query_text, top_k, min_similarity).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!(corpus_id, error = %e, "context retrieval failed; continuing without it");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chunk, ChunkMetadata};

    fn store_with(embeddings: Vec<(&str, Vec<f32>)>) -> CorpusStore {
        let mut store = CorpusStore::new();
        for (content, embedding) in embeddings {
            store
                .documents
                .push(Chunk::new(content, embedding, ChunkMetadata::default()));
        }
        store
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.5, 0.01];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_symmetric() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-2.0, 0.5, 1.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_orthogonal_and_opposite() {
        let a = vec![1.0, 0.0];
        assert!((cosine_similarity(&a, &[0.0, 1.0])).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero_not_nan() {
        let zero = vec![0.0, 0.0, 0.0];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_rank_orders_by_similarity() {
        let store = store_with(vec![
            ("sorting", vec![1.0, 0.0]),
            ("hashing", vec![0.0, 1.0]),
            ("mixed", vec![0.7, 0.7]),
        ]);

        let results = rank_chunks(&store, &[0.0, 1.0], 3, 0.0);
        assert_eq!(results, vec!["hashing", "mixed", "sorting"]);
    }

    #[test]
    fn test_rank_respects_top_k() {
        let store = store_with(vec![
            ("a", vec![1.0, 0.0]),
            ("b", vec![0.9, 0.1]),
            ("c", vec![0.8, 0.2]),
        ]);

        let results = rank_chunks(&store, &[1.0, 0.0], 1, 0.0);
        assert_eq!(results, vec!["a"]);
    }

    #[test]
    fn test_rank_filters_below_min_similarity() {
        let store = store_with(vec![
            ("relevant", vec![1.0, 0.0]),
            ("irrelevant", vec![0.0, 1.0]),
        ]);

        let results = rank_chunks(&store, &[1.0, 0.0], 5, 0.5);
        assert_eq!(results, vec!["relevant"]);
    }

    #[test]
    fn test_rank_ties_keep_insertion_order() {
        let store = store_with(vec![
            ("first", vec![1.0, 0.0]),
            ("second", vec![2.0, 0.0]),
            ("third", vec![0.5, 0.0]),
        ]);

        // All three are parallel to the query, so every score is 1.0.
        let results = rank_chunks(&store, &[1.0, 0.0], 3, 0.0);
        assert_eq!(results, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_rank_mismatched_query_dimension_returns_nothing() {
        let store = store_with(vec![
            ("two dims", vec![1.0, 0.0]),
            ("also two", vec![0.0, 1.0]),
        ]);

        // A 3-dim query against a 2-dim corpus must not rank on truncated
        // dot products.
        assert!(rank_chunks(&store, &[1.0, 0.0, 0.0], 5, 0.0).is_empty());
        assert!(rank_chunks(&store, &[1.0], 5, 0.0).is_empty());

        // Matching dimensionality still ranks.
        assert_eq!(rank_chunks(&store, &[1.0, 0.0], 1, 0.0), vec!["two dims"]);
    }

    #[test]
    fn test_rank_zero_embeddings_score_zero() {
        let store = store_with(vec![("empty", vec![0.0, 0.0])]);
        let results = rank_chunks(&store, &[1.0, 0.0], 5, 0.0);
        // Score 0 passes a 0 threshold; no NaN, no panic.
        assert_eq!(results, vec!["empty"]);

        let filtered = rank_chunks(&store, &[1.0, 0.0], 5, 0.1);
        assert!(filtered.is_empty());
    }
}
