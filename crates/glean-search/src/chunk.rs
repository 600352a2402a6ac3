//! Splitting a source text into offset-tagged chunks.
//!
//! Chunk offsets bracket the trimmed chunk text exactly, so
//! `source[chunk.start_offset..chunk.end_offset] == chunk.text`. Whitespace
//! between chunks is never part of a chunk; the highlight projector emits it
//! as plain gap segments.

use glean_core::{ChunkStrategy, TextChunk};
use regex::Regex;
use std::sync::LazyLock;

static SENTENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence pattern is valid"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){2,}").expect("paragraph pattern is valid"));

/// Split `text` with the given strategy.
#[must_use]
pub fn chunk_text(text: &str, strategy: ChunkStrategy) -> Vec<TextChunk> {
    match strategy {
        ChunkStrategy::Sentences => chunk_by_sentences(text),
        ChunkStrategy::Paragraphs => chunk_by_paragraphs(text),
    }
}

/// Runs of non-terminator characters followed by one or more of `.!?`.
///
/// Text after the last terminator becomes one final chunk reaching to the end
/// of the input.
#[must_use]
pub fn chunk_by_sentences(text: &str) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut cursor = 0;

    for m in SENTENCE.find_iter(text) {
        if let Some(chunk) = trimmed_chunk(text, m.start(), m.end()) {
            chunks.push(chunk);
        }
        cursor = m.end();
    }

    if cursor < text.len() {
        chunks.extend(trimmed_chunk(text, cursor, text.len()));
    }

    chunks
}

/// Blocks separated by two or more newlines.
///
/// Each paragraph is located by scanning forward from the end of the previous
/// one, so repeated identical paragraphs get distinct, increasing offsets.
#[must_use]
pub fn chunk_by_paragraphs(text: &str) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let mut cursor = 0;

    for raw in PARAGRAPH_BREAK.split(text) {
        if raw.trim().is_empty() {
            continue;
        }
        let Some(found) = text[cursor..].find(raw) else {
            continue;
        };
        let start = cursor + found;
        let end = start + raw.len();
        if let Some(chunk) = trimmed_chunk(text, start, end) {
            chunks.push(chunk);
        }
        cursor = end;
    }

    chunks
}

/// Build a chunk for `text[start..end]` with surrounding whitespace removed,
/// or `None` when nothing but whitespace remains.
fn trimmed_chunk(text: &str, start: usize, end: usize) -> Option<TextChunk> {
    let raw = &text[start..end];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start_offset = start + leading;
    Some(TextChunk {
        text: trimmed.to_owned(),
        start_offset,
        end_offset: start_offset + trimmed.len(),
        score: 0.0,
    })
}
