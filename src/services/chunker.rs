//! Text chunking with overlap, sized for embedding and retrieval granularity.

use crate::models::ChunkingConfig;

/// Separator priority for recursive splitting: paragraph breaks, line
/// breaks, sentence boundaries, spaces, then raw character windows.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits extracted document text into overlapping substrings.
///
/// Splitting is recursive: a piece that still exceeds the target size after
/// splitting on one separator is split again with the next one down the
/// priority list, bottoming out at fixed-width character windows.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap carried between consecutive chunks, in characters
    overlap: usize,
    /// Chunks shorter than this are discarded post-split
    min_chunk_len: usize,
}

impl TextChunker {
    /// Create a new text chunker with the given configuration.
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size as usize,
            overlap: (config.chunk_overlap as usize).min(config.chunk_size as usize / 2),
            min_chunk_len: config.min_chunk_len as usize,
        }
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self::new(&ChunkingConfig::default())
    }

    /// Chunk text into overlapping segments.
    ///
    /// Never returns zero chunks for non-empty input: if every split piece
    /// falls under the minimum length, the original text is returned as a
    /// single chunk so short documents still ingest.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        if text.chars().count() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let pieces = self.split_recursive(text, 0);
        let kept: Vec<String> = pieces
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| p.chars().count() >= self.min_chunk_len)
            .collect();

        if kept.is_empty() {
            vec![text.to_string()]
        } else {
            kept
        }
    }

    fn split_recursive(&self, text: &str, sep_idx: usize) -> Vec<String> {
        if text.chars().count() <= self.chunk_size {
            return vec![text.to_string()];
        }

        if sep_idx >= SEPARATORS.len() {
            return self.split_char_windows(text);
        }

        let sep = SEPARATORS[sep_idx];
        let parts: Vec<&str> = text.split(sep).filter(|p| !p.is_empty()).collect();
        if parts.len() <= 1 {
            return self.split_recursive(text, sep_idx + 1);
        }

        self.merge_parts(&parts, sep, sep_idx)
    }

    /// Merge split pieces back into chunks near the target size, carrying
    /// `overlap` trailing characters from each chunk into the next.
    fn merge_parts(&self, parts: &[&str], sep: &str, sep_idx: usize) -> Vec<String> {
        let sep_len = sep.chars().count();
        let mut chunks = Vec::new();
        let mut current = String::new();

        for part in parts {
            let part_len = part.chars().count();

            if part_len > self.chunk_size {
                // Oversized piece: flush and split it with the next separator.
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                chunks.extend(self.split_recursive(part, sep_idx + 1));
                continue;
            }

            let current_len = current.chars().count();
            let joined_len = if current.is_empty() {
                part_len
            } else {
                current_len + sep_len + part_len
            };

            if joined_len > self.chunk_size && !current.is_empty() {
                chunks.push(current.clone());
                current = char_tail(&current, self.overlap);
                // Drop the overlap seed when it would push the next chunk
                // past the target; emitted chunks never exceed chunk_size.
                if current.chars().count() + sep_len + part_len > self.chunk_size {
                    current.clear();
                }
            }

            if !current.is_empty() {
                current.push_str(sep);
            }
            current.push_str(part);
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Last-resort split: fixed character windows stepped by size - overlap.
    fn split_char_windows(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size.saturating_sub(self.overlap).max(1);
        let mut out = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        out
    }
}

/// Last `n` characters of a string.
fn char_tail(s: &str, n: usize) -> String {
    let count = s.chars().count();
    if count <= n {
        return s.to_string();
    }
    s.chars().skip(count - n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(size: u32, overlap: u32, min_len: u32) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
            min_chunk_len: min_len,
            ..Default::default()
        })
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::with_defaults();
        let chunks = chunker.chunk("Binary search requires sorted input.");
        assert_eq!(chunks, vec!["Binary search requires sorted input."]);
    }

    #[test]
    fn test_empty_text() {
        let chunker = TextChunker::with_defaults();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n  ").is_empty());
    }

    #[test]
    fn test_rechunking_own_output_is_identity() {
        let chunker = chunker(100, 10, 5);
        let text = "Paragraph one about sorting.\n\nParagraph two about hashing.\n\n\
                    Paragraph three about graphs and traversal orders in detail."
            .repeat(3);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);

        for chunk in &chunks {
            assert_eq!(chunker.chunk(chunk), vec![chunk.clone()]);
        }
    }

    #[test]
    fn test_splits_on_paragraphs_first() {
        let chunker = chunker(40, 0, 5);
        let text = "First paragraph body text here.\n\nSecond paragraph body text here.";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("First paragraph"));
        assert!(chunks[1].starts_with("Second paragraph"));
    }

    #[test]
    fn test_chunks_respect_target_size_on_prose() {
        let chunker = chunker(80, 10, 5);
        let sentence = "The quick brown fox jumps over the lazy dog. ";
        let text = sentence.repeat(20);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 80);
        }
    }

    #[test]
    fn test_overlap_carried_between_chunks() {
        let chunker = chunker(50, 15, 1);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu";
        let chunks = chunker.chunk(text);
        assert!(chunks.len() > 1);

        // The head of each later chunk repeats the tail of its predecessor.
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(5).collect::<String>();
            let tail: String = tail.chars().rev().collect();
            assert!(pair[1].contains(tail.trim()));
        }
    }

    #[test]
    fn test_unbroken_text_falls_back_to_char_windows() {
        let chunker = chunker(100, 10, 5);
        let text = "x".repeat(500);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn test_discards_fragments_but_never_everything() {
        // All pieces land below the minimum length; the original text must
        // come back as a single chunk rather than nothing.
        let chunker = chunker(4, 0, 50);
        let text = "a b c d e f g h";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }
}
