//! File utilities for ingestion.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Calculate SHA-256 checksum of content.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Read file content with size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    fs::read_to_string(path)
}

/// Filesystem directory name for a corpus identifier.
///
/// Identifiers that survive sanitization unchanged map to themselves. When
/// sanitization alters the id, a short hash of the raw id is appended so
/// distinct ids can never collide on one directory (`"a/b"` and `"a:b"`
/// both sanitize to `a-b`). An id with no filesystem-safe characters at all
/// has no usable name and yields `None`.
pub fn corpus_dir_name(corpus_id: &str) -> Option<String> {
    let sanitized = sanitize_corpus_id(corpus_id);
    if sanitized.is_empty() {
        return None;
    }
    if sanitized == corpus_id {
        return Some(sanitized);
    }
    let digest = calculate_checksum(corpus_id);
    Some(format!("{sanitized}-{}", &digest[..8]))
}

/// Sanitize a corpus identifier for filesystem use.
///
/// Replaces characters that are not allowed in filenames on common operating
/// systems (Windows, macOS, Linux) with hyphens.
pub fn sanitize_corpus_id(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_checksum() {
        let checksum = calculate_checksum("hello world");
        assert_eq!(checksum.len(), 64); // SHA-256 produces 64 hex chars
    }

    #[test]
    fn test_sanitize_corpus_id() {
        assert_eq!(sanitize_corpus_id("cs201"), "cs201");
        assert_eq!(sanitize_corpus_id("class/assignment:1"), "class-assignment-1");
        assert_eq!(sanitize_corpus_id("../escape"), "..-escape");
    }

    #[test]
    fn test_corpus_dir_name_plain_ids_unchanged() {
        assert_eq!(corpus_dir_name("cs201").as_deref(), Some("cs201"));
        assert_eq!(
            corpus_dir_name("week-3_lectures").as_deref(),
            Some("week-3_lectures")
        );
    }

    #[test]
    fn test_corpus_dir_name_rejects_unusable_ids() {
        assert!(corpus_dir_name(":").is_none());
        assert!(corpus_dir_name("///").is_none());
        assert!(corpus_dir_name("").is_none());
    }

    #[test]
    fn test_corpus_dir_name_disambiguates_collisions() {
        let slash = corpus_dir_name("a/b").unwrap();
        let colon = corpus_dir_name("a:b").unwrap();
        assert_ne!(slash, colon);
        assert!(slash.starts_with("a-b-"));
        assert!(colon.starts_with("a-b-"));
    }

    #[test]
    fn test_read_file_content_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "short document").unwrap();

        assert!(read_file_content(&path, 1024).is_ok());
        assert!(read_file_content(&path, 4).is_err());
    }
}
