//! Sliding-window chunking of guideline documents.
//!
//! Chunks are measured in characters, not bytes, so multi-byte text never
//! splits mid-character. Consecutive chunks overlap so that statements near
//! a boundary stay retrievable from at least one chunk.

/// Target chunk size in characters.
pub const CHUNK_SIZE: usize = 800;

/// Overlap between consecutive chunks in characters.
pub const CHUNK_OVERLAP: usize = 150;

/// Documents longer than this are truncated before chunking.
pub const MAX_DOCUMENT_CHARS: usize = 50_000;

/// Split text into overlapping chunks of [`CHUNK_SIZE`] characters.
pub fn chunk_text(text: &str) -> Vec<String> {
    chunk_with(text, CHUNK_SIZE, CHUNK_OVERLAP)
}

/// Split text into overlapping chunks of `size` characters.
///
/// Each next chunk starts `overlap` characters before the previous one
/// ended. Empty text produces no chunks.
pub fn chunk_with(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || size == 0 {
        return Vec::new();
    }

    // The window must advance each iteration.
    let overlap = overlap.min(size - 1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = usize::min(start + size, chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end >= chars.len() {
            break;
        }
        start = end - overlap;
    }
    chunks
}

/// The document title: the first markdown h1 heading, if any.
pub fn extract_title(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        line.strip_prefix("# ").and_then(|rest| {
            let title = rest.trim_start_matches(['#', ' ']).trim();
            if title.is_empty() {
                None
            } else {
                Some(title.to_string())
            }
        })
    })
}

/// Truncate a document to [`MAX_DOCUMENT_CHARS`] characters.
///
/// Returns the (possibly shortened) text and whether truncation happened.
pub fn truncate_document(content: String) -> (String, bool) {
    if content.chars().count() <= MAX_DOCUMENT_CHARS {
        return (content, false);
    }
    (content.chars().take(MAX_DOCUMENT_CHARS).collect(), true)
}
