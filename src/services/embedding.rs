//! Embedding client for the remote text-embedding endpoint.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::EmbeddingError;
use crate::models::{EMBEDDING_API_KEY_ENV, EmbeddingConfig};
use crate::utils::retry::{RetryConfig, with_retry};

/// Request body for the OpenAI-compatible `/v1/embeddings` endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedVector>,
}

#[derive(Debug, Deserialize)]
struct EmbedVector {
    embedding: Vec<f32>,
}

/// Client for turning text into fixed-length embedding vectors.
///
/// Throttled calls are retried with the backoff policy configured for the
/// embedding endpoint; every other failure propagates immediately.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    ///
    /// The API key, if the endpoint needs one, comes from the
    /// `RAGTUTOR_EMBEDDING_API_KEY` environment variable.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: std::env::var(EMBEDDING_API_KEY_ENV).ok(),
            retry: RetryConfig::new(config.max_attempts)
                .with_initial_delay(Duration::from_millis(config.base_delay_ms))
                .with_max_delay(Duration::from_millis(config.max_delay_ms)),
        })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self, EmbeddingError> {
        Self::new(&EmbeddingConfig::default())
    }

    /// Generate the embedding vector for one text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let result = with_retry(&self.retry, || self.embed_once(text)).await;
        match result {
            crate::utils::RetryResult::Success(v) => Ok(v),
            crate::utils::RetryResult::Failed {
                last_error,
                attempts,
            } => {
                debug!(attempts, error = %last_error, "embedding request failed");
                Err(last_error)
            }
        }
    }

    /// Generate embeddings for a batch of texts, one request per text.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: vec![text],
        };

        let mut http = self.client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(EmbeddingError::Request)?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|v| v.embedding)
            .filter(|e| !e.is_empty())
            .ok_or(EmbeddingError::EmptyPayload)
    }

    /// Get the base URL of the embedding endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = EmbeddingConfig::default();
        let client = EmbeddingClient::new(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let client = EmbeddingClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_retry_policy_comes_from_config() {
        let config = EmbeddingConfig {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 5_000,
            ..Default::default()
        };
        let client = EmbeddingClient::new(&config).unwrap();
        assert_eq!(client.retry.max_attempts, 3);
        assert_eq!(client.retry.initial_delay, Duration::from_millis(100));
        assert_eq!(client.retry.max_delay, Duration::from_millis(5_000));
    }

    #[test]
    fn test_embed_request_shape() {
        let request = EmbedRequest {
            model: "nomic-embed-text",
            input: vec!["lookup time complexity"],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"nomic-embed-text\""));
        assert!(json.contains("\"input\":[\"lookup time complexity\"]"));
    }

    #[test]
    fn test_embed_response_parsing() {
        let body = r#"{"data":[{"embedding":[0.1,0.2,0.3]}],"model":"nomic-embed-text"}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2, 0.3]);
    }
}
