//! Generation client: streaming chat completions with throttle retry.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::models::{GENERATION_API_KEY_ENV, GenerationConfig};
use crate::utils::retry::{RetryConfig, RetryResult, with_retry};

/// One answer request to the upstream model.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Client for the streaming messages endpoint of a chat-completion model.
///
/// Opening a stream is wrapped in a retry loop that fires only on upstream
/// throttling: capped exponential backoff with full jitter, bounded by the
/// configured attempt ceiling. Non-throttling failures propagate on the
/// first attempt. Once a stream is open, errors are no longer retried.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
    retry: RetryConfig,
}

impl GenerationClient {
    /// Create a new generation client with the given configuration.
    ///
    /// The API key comes from the `RAGTUTOR_GENERATION_API_KEY` environment
    /// variable.
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        // No overall request timeout: answers stream for as long as the
        // model talks. Connection setup gets its own bound.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: std::env::var(GENERATION_API_KEY_ENV).ok(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry: RetryConfig::new(config.max_attempts)
                .with_initial_delay(Duration::from_millis(config.base_delay_ms))
                .with_max_delay(Duration::from_millis(config.max_delay_ms)),
        })
    }

    /// Default token budget for answers.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Default sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Open a finite, non-restartable stream of answer deltas.
    pub async fn stream_answer(
        &self,
        request: &AnswerRequest,
    ) -> Result<AnswerStream, GenerationError> {
        match with_retry(&self.retry, || self.open_stream(request)).await {
            RetryResult::Success(stream) => Ok(stream),
            RetryResult::Failed {
                last_error: GenerationError::RateLimited,
                attempts,
            } => {
                warn!(attempts, "generation throttled through every attempt");
                Err(GenerationError::Throttled { attempts })
            }
            RetryResult::Failed { last_error, .. } => Err(last_error),
        }
    }

    async fn open_stream(&self, request: &AnswerRequest) -> Result<AnswerStream, GenerationError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system_prompt,
            "messages": [{ "role": "user", "content": request.prompt }],
            "stream": true,
        });

        let mut http = self
            .client
            .post(&url)
            .header("anthropic-version", "2023-06-01")
            .json(&body);
        if let Some(ref key) = self.api_key {
            http = http.header("x-api-key", key);
        }

        let response = http.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            debug!("generation endpoint returned 429");
            return Err(GenerationError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(AnswerStream::new(response.bytes_stream()))
    }
}

/// Upstream transport events; only text deltas carry answer content.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum UpstreamEvent {
    ContentBlockDelta { delta: UpstreamDelta },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct UpstreamDelta {
    #[serde(default)]
    text: Option<String>,
}

/// Pull-based stream of incremental answer text.
///
/// Yields only content-bearing deltas, in arrival order; protocol-level
/// metadata events from the transport are filtered out. Dropping the stream
/// drops the underlying response, aborting the upstream call.
pub struct AnswerStream {
    bytes: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    parser: SseParser,
    pending: VecDeque<String>,
    done: bool,
}

impl AnswerStream {
    fn new(bytes: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static) -> Self {
        Self {
            bytes: Box::pin(bytes),
            parser: SseParser::default(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Next text delta, or `None` at end of stream.
    pub async fn next_delta(&mut self) -> Result<Option<String>, GenerationError> {
        loop {
            if let Some(delta) = self.pending.pop_front() {
                return Ok(Some(delta));
            }
            if self.done {
                return Ok(None);
            }

            match self.bytes.next().await {
                Some(Ok(bytes)) => {
                    for payload in self.parser.feed(&bytes)? {
                        if let Some(delta) = extract_text_delta(&payload)? {
                            self.pending.push_back(delta);
                        }
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Err(GenerationError::Request(e));
                }
                None => {
                    self.done = true;
                }
            }
        }
    }
}

/// Pick the answer text out of one event payload, if it carries any.
fn extract_text_delta(payload: &str) -> Result<Option<String>, GenerationError> {
    let event: UpstreamEvent = serde_json::from_str(payload)
        .map_err(|e| GenerationError::InvalidEvent(format!("{e}: {payload}")))?;

    match event {
        UpstreamEvent::ContentBlockDelta { delta } => {
            Ok(delta.text.filter(|t| !t.is_empty()))
        }
        UpstreamEvent::Other => Ok(None),
    }
}

/// Incremental server-sent-events parser.
///
/// Network chunks split frames, and even UTF-8 sequences, at arbitrary
/// byte boundaries; the parser buffers until it has complete lines and
/// returns the `data:` payloads it finds.
#[derive(Debug, Default)]
struct SseParser {
    buf: Vec<u8>,
}

impl SseParser {
    fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, GenerationError> {
        self.buf.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=newline).collect();
            let line = std::str::from_utf8(&line)
                .map_err(|e| GenerationError::InvalidEvent(e.to_string()))?
                .trim_end_matches(['\n', '\r']);

            if let Some(payload) = line.strip_prefix("data:") {
                let payload = payload.trim();
                if !payload.is_empty() {
                    payloads.push(payload.to_string());
                }
            }
            // "event:" lines, comments, and blank separators carry nothing.
        }
        Ok(payloads)
    }
}
