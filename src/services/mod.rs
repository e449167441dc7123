//! Core services: chunking, embedding, storage, retrieval, generation, and
//! answer orchestration.

pub mod chunker;
pub mod embedding;
pub mod generation;
pub mod ingest;
pub mod orchestrator;
pub mod search;
pub mod store;

pub use chunker::TextChunker;
pub use embedding::EmbeddingClient;
pub use generation::{AnswerRequest, AnswerStream, GenerationClient};
pub use ingest::IngestPipeline;
pub use orchestrator::{
    AnswerDeltas, AnswerOrchestrator, AnswerSource, TutorRequest, compose_system_prompt,
};
pub use search::{ContextRetriever, cosine_similarity, rank_chunks};
pub use store::CorpusStoreClient;
