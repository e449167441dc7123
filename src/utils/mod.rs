//! Utility modules.

pub mod file;
pub mod retry;

pub use file::{calculate_checksum, corpus_dir_name, read_file_content, sanitize_corpus_id};
pub use retry::{RetryConfig, RetryResult, Retryable, with_retry};
