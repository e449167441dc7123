//! Retrieval-grounded tutoring assistant core.
//!
//! Ingests course materials into per-corpus vector stores, retrieves the
//! most relevant chunks for a question, and streams a grounded answer over a
//! newline-delimited `data:` frame protocol.

pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{
    ConfigError, EmbeddingError, GenerationError, IngestError, QueryError, StoreError,
};
pub use models::Config;
