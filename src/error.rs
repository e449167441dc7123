//! Error types for the RAG tutoring core.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors from the remote embedding endpoint.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embedding endpoint returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("embedding endpoint is rate limiting requests")]
    RateLimited,

    #[error("embedding response carried no vector")]
    EmptyPayload,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        // Same policy as generation: only back off on throttling.
        matches!(self, EmbeddingError::RateLimited)
    }
}

/// Errors from the remote chat-completion endpoint.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation endpoint returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Single throttled attempt; retried internally, never surfaced.
    #[error("generation endpoint is rate limiting requests")]
    RateLimited,

    /// All retry attempts were throttled. The message is user-facing.
    #[error("AI tutor is experiencing high demand. Please wait 30 seconds and try again.")]
    Throttled { attempts: u32 },

    #[error("malformed stream event: {0}")]
    InvalidEvent(String),
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::RateLimited)
    }
}

/// Errors from the persisted corpus store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("corpus id '{corpus_id}' has no filesystem-safe characters")]
    InvalidCorpusId { corpus_id: String },

    #[error("corpus store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus store for '{corpus_id}' is corrupt: {source}")]
    Corrupt {
        corpus_id: String,
        source: serde_json::Error,
    },

    #[error("corpus store serialization error: {0}")]
    Serialize(serde_json::Error),

    #[error(
        "embedding dimension mismatch in corpus '{corpus_id}': expected {expected}, got {actual}"
    )]
    DimensionMismatch {
        corpus_id: String,
        expected: usize,
        actual: usize,
    },
}

/// Errors from the ingestion path.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Document extraction produced no usable text. Surfaced distinctly so
    /// callers can suggest OCR or an alternate format.
    #[error("no usable text extracted from document")]
    NoTextExtracted,

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the context retrieval path.
///
/// An absent or empty corpus is not an error; retrieval returns an empty
/// result set in that case.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limits_are_retryable() {
        assert!(GenerationError::RateLimited.is_retryable());
        assert!(EmbeddingError::RateLimited.is_retryable());

        assert!(
            !GenerationError::Upstream {
                status: 500,
                body: "internal error".to_string(),
            }
            .is_retryable()
        );
        assert!(!GenerationError::Throttled { attempts: 10 }.is_retryable());
        assert!(!EmbeddingError::EmptyPayload.is_retryable());
    }

    #[test]
    fn test_throttled_message_carries_user_hint() {
        let err = GenerationError::Throttled { attempts: 10 };
        let msg = err.to_string();
        assert!(msg.contains("high demand"));
        assert!(msg.contains("try again"));
    }
}
