mod config;
mod corpus;
mod query;
mod stream;

pub use config::{
    ChunkingConfig, Config, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL,
    DEFAULT_GENERATION_MODEL, DEFAULT_GENERATION_URL, EMBEDDING_API_KEY_ENV, EmbeddingConfig,
    GENERATION_API_KEY_ENV, GenerationConfig, OutputConfig, RetrievalConfig, StorageConfig,
};
pub use corpus::{Chunk, ChunkMetadata, CorpusStore, ProblemContext};
pub use query::{OutputFormat, QueryResults};
pub use stream::{DONE_FRAME, FRAME_PREFIX, Frame, StreamEvent, decode_frame};
