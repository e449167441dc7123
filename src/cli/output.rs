use std::fmt::Write as FmtWrite;

use crate::models::{OutputFormat, QueryResults};

pub trait Formatter {
    fn format_query_results(&self, results: &QueryResults) -> String;
    fn format_corpus_status(&self, status: &CorpusStatus) -> String;
    fn format_ingest_stats(&self, stats: &IngestStats) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct CorpusStatus {
    pub corpus_id: String,
    pub exists: bool,
    pub chunks: u64,
    pub embedding_dimension: Option<usize>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub files_scanned: u64,
    pub files_ingested: u64,
    pub files_skipped: u64,
    pub chunks_stored: u64,
    pub duration_ms: u64,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_query_results(&self, results: &QueryResults) -> String {
        if results.is_empty() {
            return format!("No matching context found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Context for: \"{}\"", results.query).unwrap();
        writeln!(
            output,
            "Found {} chunks in corpus '{}' ({}ms)\n",
            results.len(),
            results.corpus_id,
            results.duration_ms
        )
        .unwrap();

        for (i, chunk) in results.results.iter().enumerate() {
            writeln!(output, "[Context {}]", i + 1).unwrap();
            for line in chunk.lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_corpus_status(&self, status: &CorpusStatus) -> String {
        let mut output = String::new();
        writeln!(output, "Corpus: {}", status.corpus_id).unwrap();
        writeln!(output, "-------").unwrap();

        if !status.exists {
            writeln!(output, "Status:     [EMPTY] (nothing ingested yet)").unwrap();
            writeln!(output, "Path:       {}", status.path).unwrap();
            return output;
        }

        writeln!(output, "Status:     [READY]").unwrap();
        writeln!(output, "Chunks:     {}", status.chunks).unwrap();
        if let Some(dim) = status.embedding_dimension {
            writeln!(output, "Dimension:  {}", dim).unwrap();
        }
        if let Some(ref created) = status.created_at {
            writeln!(output, "Created:    {}", created).unwrap();
        }
        if let Some(ref updated) = status.updated_at {
            writeln!(output, "Updated:    {}", updated).unwrap();
        }
        writeln!(output, "Path:       {}", status.path).unwrap();
        output
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Files scanned:  {}", stats.files_scanned).unwrap();
        writeln!(output, "Files ingested: {}", stats.files_ingested).unwrap();
        writeln!(output, "Files skipped:  {}", stats.files_skipped).unwrap();
        writeln!(output, "Chunks stored:  {}", stats.chunks_stored).unwrap();
        writeln!(output, "Duration: {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(json).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        } else {
            serde_json::to_string(json).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_query_results(&self, results: &QueryResults) -> String {
        let json = serde_json::to_value(results)
            .unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}));
        self.render(&json)
    }

    fn format_corpus_status(&self, status: &CorpusStatus) -> String {
        let json = serde_json::json!({
            "corpus_id": status.corpus_id,
            "exists": status.exists,
            "chunks": status.chunks,
            "embedding_dimension": status.embedding_dimension,
            "created_at": status.created_at,
            "updated_at": status.updated_at,
            "path": status.path,
        });
        self.render(&json)
    }

    fn format_ingest_stats(&self, stats: &IngestStats) -> String {
        let json = serde_json::json!({
            "files_scanned": stats.files_scanned,
            "files_ingested": stats.files_ingested,
            "files_skipped": stats.files_skipped,
            "chunks_stored": stats.chunks_stored,
            "duration_ms": stats.duration_ms,
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
