//! Text chunking for the ingestion pipeline.
//!
//! Two strategies:
//!
//! - **Fixed** — a sliding character window of `chunk_size` characters that
//!   advances by `chunk_size - overlap` (clamped to at least one character,
//!   so a misconfigured `overlap >= chunk_size` still terminates). Every
//!   character of the input is covered by at least one window, and the final
//!   window always ends at the last character.
//! - **Paragraph** — split on blank-line boundaries, trim each paragraph,
//!   drop empties. Paragraphs at or under `chunk_size` characters are
//!   emitted whole; oversized paragraphs fall back to fixed-mode windows.
//!
//! All indexing is character-based, never raw byte offsets, so multibyte
//! UTF-8 input cannot split a code point.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Blank-line paragraph boundary: a newline, optional horizontal
/// whitespace, then at least one more newline.
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n\s*").unwrap());

/// Chunking strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    Fixed,
    Paragraph,
}

impl ChunkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkMode::Fixed => "fixed",
            ChunkMode::Paragraph => "paragraph",
        }
    }
}

impl FromStr for ChunkMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(ChunkMode::Fixed),
            "paragraph" => Ok(ChunkMode::Paragraph),
            other => anyhow::bail!("Unknown chunk mode: '{}'. Use fixed or paragraph.", other),
        }
    }
}

/// Split `text` into chunk strings.
///
/// `chunk_size` and `overlap` are measured in characters. Empty input
/// yields zero chunks in either mode. Output is deterministic for a given
/// `(text, chunk_size, overlap, mode)`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize, mode: ChunkMode) -> Vec<String> {
    match mode {
        ChunkMode::Fixed => chunk_fixed(text, chunk_size, overlap),
        ChunkMode::Paragraph => chunk_paragraphs(text, chunk_size, overlap),
    }
}

/// Sliding-window chunking over the raw text.
fn chunk_fixed(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every character boundary, including the end of text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = bounds.len() - 1;

    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        if end == char_count {
            break;
        }
        start += step;
    }
    chunks
}

/// Paragraph-aligned chunking with fixed-mode fallback for long paragraphs.
fn chunk_paragraphs(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    for para in PARAGRAPH_BREAK.split(text) {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }
        if para.chars().count() <= chunk_size {
            chunks.push(para.to_string());
        } else {
            chunks.extend(chunk_fixed(para, chunk_size, overlap));
        }
    }
    chunks
}
