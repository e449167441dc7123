mod ask;
mod config;
mod corpus;
mod ingest;
mod query;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use corpus::CorpusCommand;
pub use ingest::IngestArgs;
pub use query::QueryArgs;

pub use ask::handle_ask;
pub use config::handle_config;
pub use corpus::handle_corpus;
pub use ingest::handle_ingest;
pub use query::handle_query;
