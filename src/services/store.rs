//! Persisted corpus store: one serialized blob per corpus identifier.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Chunk, CorpusStore, StorageConfig};
use crate::utils::corpus_dir_name;

const STORE_FILE: &str = "vectors.json";

/// Key-addressed store of corpus blobs on the local filesystem.
///
/// Every mutation is a read-modify-write of the whole blob, so writers for
/// the same corpus id are serialized through a per-key mutex. Reads take no
/// lock; they may observe a store mid-update and that is accepted as
/// best-effort consistency.
#[derive(Debug)]
pub struct CorpusStoreClient {
    root: PathBuf,
    write_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CorpusStoreClient {
    /// Create a store client rooted at the configured data directory.
    pub fn new(config: &StorageConfig) -> Self {
        Self::with_root(config.data_dir.clone())
    }

    /// Create a store client rooted at an explicit directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            write_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Append chunks to the corpus, creating the store on first use.
    ///
    /// Fails with [`StoreError::DimensionMismatch`] if a chunk's embedding
    /// length differs from the corpus's established dimensionality.
    pub async fn append(&self, corpus_id: &str, chunks: Vec<Chunk>) -> Result<(), StoreError> {
        if chunks.is_empty() {
            return Ok(());
        }

        let key = self.corpus_key(corpus_id)?;
        let lock = self.write_lock(&key);
        let _guard = lock.lock().await;

        let mut store = self.load_by_key(corpus_id, &key).await?.unwrap_or_default();

        let mut expected = store.embedding_dimension();
        for chunk in &chunks {
            match expected {
                Some(dim) if chunk.embedding.len() != dim => {
                    return Err(StoreError::DimensionMismatch {
                        corpus_id: corpus_id.to_string(),
                        expected: dim,
                        actual: chunk.embedding.len(),
                    });
                }
                Some(_) => {}
                None => expected = Some(chunk.embedding.len()),
            }
        }

        let appended = chunks.len();
        store.documents.extend(chunks);
        store.updated_at = chrono::Utc::now().to_rfc3339();

        self.persist(&key, &store).await?;
        debug!(corpus_id, appended, total = store.len(), "corpus updated");
        Ok(())
    }

    /// Load the corpus, or `None` if nothing has been ingested yet.
    ///
    /// Absence is the normal "no materials uploaded" state, not a failure.
    pub async fn load(&self, corpus_id: &str) -> Result<Option<CorpusStore>, StoreError> {
        let key = self.corpus_key(corpus_id)?;
        self.load_by_key(corpus_id, &key).await
    }

    async fn load_by_key(
        &self,
        corpus_id: &str,
        key: &str,
    ) -> Result<Option<CorpusStore>, StoreError> {
        let path = self.store_file(key);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let store = serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
            corpus_id: corpus_id.to_string(),
            source,
        })?;
        Ok(Some(store))
    }

    /// Whether a store exists for the corpus.
    pub async fn exists(&self, corpus_id: &str) -> bool {
        let Ok(key) = self.corpus_key(corpus_id) else {
            return false;
        };
        tokio::fs::try_exists(self.store_file(&key))
            .await
            .unwrap_or(false)
    }

    /// Delete the corpus. Idempotent; absence is not an error.
    pub async fn delete(&self, corpus_id: &str) -> Result<(), StoreError> {
        let key = self.corpus_key(corpus_id)?;
        let lock = self.write_lock(&key);
        let _guard = lock.lock().await;

        let dir = self.corpus_dir(&key);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    /// Write the blob to a temp file, then rename over the live one.
    async fn persist(&self, key: &str, store: &CorpusStore) -> Result<(), StoreError> {
        let path = self.store_file(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(store).map_err(StoreError::Serialize)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Directory name backing a corpus id.
    ///
    /// An id that sanitizes to nothing is rejected here, never mapped to the
    /// store root: operating on the root would touch every corpus at once.
    fn corpus_key(&self, corpus_id: &str) -> Result<String, StoreError> {
        corpus_dir_name(corpus_id).ok_or_else(|| StoreError::InvalidCorpusId {
            corpus_id: corpus_id.to_string(),
        })
    }

    fn corpus_dir(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn store_file(&self, key: &str) -> PathBuf {
        self.corpus_dir(key).join(STORE_FILE)
    }

    fn write_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(key.to_string()).or_default().clone()
    }

    /// Directory that backs a corpus id, for display purposes.
    pub fn corpus_path(&self, corpus_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self.corpus_dir(&self.corpus_key(corpus_id)?))
    }

    /// Root directory holding all corpus blobs.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn chunk(content: &str, embedding: Vec<f32>) -> Chunk {
        Chunk::new(content, embedding, ChunkMetadata::default())
    }

    fn test_client() -> (tempfile::TempDir, Arc<CorpusStoreClient>) {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(CorpusStoreClient::with_root(dir.path().to_path_buf()));
        (dir, client)
    }

    #[tokio::test]
    async fn test_load_absent_corpus_is_none() {
        let (_dir, client) = test_client();
        assert!(client.load("nonexistent-corpus").await.unwrap().is_none());
        assert!(!client.exists("nonexistent-corpus").await);
    }

    #[tokio::test]
    async fn test_append_then_load_round_trip() {
        let (_dir, client) = test_client();

        client
            .append("cs201", vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.0, 1.0])])
            .await
            .unwrap();
        client
            .append("cs201", vec![chunk("c", vec![0.5, 0.5])])
            .await
            .unwrap();

        let store = client.load("cs201").await.unwrap().unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.documents[0].content, "a");
        assert_eq!(store.documents[2].content, "c");
        assert!(client.exists("cs201").await);
    }

    #[tokio::test]
    async fn test_append_preserves_created_at() {
        let (_dir, client) = test_client();

        client
            .append("cs201", vec![chunk("a", vec![1.0])])
            .await
            .unwrap();
        let first = client.load("cs201").await.unwrap().unwrap();

        client
            .append("cs201", vec![chunk("b", vec![2.0])])
            .await
            .unwrap();
        let second = client.load("cs201").await.unwrap().unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let (_dir, client) = test_client();

        client
            .append("cs201", vec![chunk("a", vec![1.0, 0.0])])
            .await
            .unwrap();

        let err = client
            .append("cs201", vec![chunk("b", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 2, actual: 3, .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, client) = test_client();

        client
            .append("cs201", vec![chunk("a", vec![1.0])])
            .await
            .unwrap();
        client.delete("cs201").await.unwrap();
        assert!(!client.exists("cs201").await);

        // Second delete of an absent corpus is still Ok.
        client.delete("cs201").await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_appends_serialize() {
        let (_dir, client) = test_client();

        let mut handles = Vec::new();
        for writer in 0..4 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                for i in 0..5 {
                    let content = format!("writer {writer} chunk {i}");
                    client
                        .append("shared", vec![chunk(&content, vec![writer as f32, i as f32])])
                        .await
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let store = client.load("shared").await.unwrap().unwrap();
        assert_eq!(store.len(), 20);
    }

    #[tokio::test]
    async fn test_corpus_ids_are_sanitized() {
        let (dir, client) = test_client();

        client
            .append("class/1:materials", vec![chunk("a", vec![1.0])])
            .await
            .unwrap();

        assert!(client.exists("class/1:materials").await);
        let dir_name = corpus_dir_name("class/1:materials").unwrap();
        assert!(dir_name.starts_with("class-1-materials-"));
        assert!(dir.path().join(dir_name).join("vectors.json").exists());
    }

    #[tokio::test]
    async fn test_unusable_id_rejected_and_other_corpora_survive() {
        let (dir, client) = test_client();

        client
            .append("cs201", vec![chunk("a", vec![1.0])])
            .await
            .unwrap();

        // An id with no filesystem-safe characters must never resolve to the
        // store root, where a delete would wipe every corpus.
        let err = client.delete(":").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCorpusId { .. }));
        let err = client.append(":", vec![chunk("b", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidCorpusId { .. }));
        assert!(!client.exists(":").await);

        assert!(client.exists("cs201").await);
        assert_eq!(client.load("cs201").await.unwrap().unwrap().len(), 1);
        assert!(!dir.path().join("vectors.json").exists());
    }

    #[tokio::test]
    async fn test_colliding_ids_get_separate_stores() {
        let (_dir, client) = test_client();

        client
            .append("a/b", vec![chunk("slash", vec![1.0])])
            .await
            .unwrap();
        client
            .append("a:b", vec![chunk("colon", vec![2.0])])
            .await
            .unwrap();

        let slash = client.load("a/b").await.unwrap().unwrap();
        let colon = client.load("a:b").await.unwrap().unwrap();
        assert_eq!(slash.len(), 1);
        assert_eq!(colon.len(), 1);
        assert_eq!(slash.documents[0].content, "slash");
        assert_eq!(colon.documents[0].content, "colon");
    }
}
