//! Projecting ranked chunks back onto their source text.

use glean_core::{HighlightedSegment, TextChunk};

/// Rebuild `text` as alternating plain and highlighted segments.
///
/// Chunks are placed by offset (their ranking order is ignored). Concatenating
/// the returned segments always reproduces `text` exactly: chunks that overlap
/// an earlier one are clipped, and spans that fall outside `text` or off a
/// char boundary are skipped.
#[must_use]
pub fn project_highlights(text: &str, chunks: &[TextChunk]) -> Vec<HighlightedSegment> {
    if text.is_empty() || chunks.is_empty() {
        return vec![HighlightedSegment::plain(text)];
    }

    let mut ordered: Vec<&TextChunk> = chunks.iter().collect();
    ordered.sort_by_key(|chunk| chunk.start_offset);

    let mut segments = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut cursor = 0;

    for chunk in ordered {
        let start = chunk.start_offset.max(cursor);
        let end = chunk.end_offset.min(text.len());
        if start >= end || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }

        if start > cursor {
            segments.push(HighlightedSegment::plain(&text[cursor..start]));
        }
        segments.push(HighlightedSegment::highlight(&text[start..end], chunk.score));
        cursor = end;
    }

    if cursor < text.len() {
        segments.push(HighlightedSegment::plain(&text[cursor..]));
    }

    if segments.is_empty() {
        segments.push(HighlightedSegment::plain(text));
    }

    segments
}
