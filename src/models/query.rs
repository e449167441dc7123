//! Query-related models for context retrieval results.

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Ranked context chunks for one retrieval query. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResults {
    /// Corpus the query ran against
    pub corpus_id: String,

    /// Query that was executed
    pub query: String,

    /// Chunk contents, ranked descending by cosine similarity
    pub results: Vec<String>,

    /// Query execution time in milliseconds
    pub duration_ms: u64,
}

impl QueryResults {
    pub fn new(corpus_id: String, query: String, results: Vec<String>, duration_ms: u64) -> Self {
        Self {
            corpus_id,
            query,
            results,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_query_results() {
        let results = QueryResults::new("cs201".to_string(), "lookup".to_string(), vec![], 12);
        assert!(results.is_empty());
        assert_eq!(results.duration_ms, 12);
    }
}
