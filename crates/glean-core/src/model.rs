//! Value types shared by the ranking pipeline and its callers.
//!
//! Offsets in [`TextChunk`] are byte offsets into the UTF-8 source text and
//! always fall on char boundaries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A caller-owned item that can be ranked against a free-text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    /// Unique identifier, opaque to the ranker.
    pub id: String,
    /// Primary display text.
    pub label: String,
    /// Extra match terms (aliases, tags).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SearchItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            keywords: Vec::new(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Anything the item rankers can score.
///
/// Only [`Searchable::label`] is required; keyword and description signals are
/// optional.
pub trait Searchable {
    fn label(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn keywords(&self) -> &[String] {
        &[]
    }

    /// Label, description and keywords joined by single spaces, empty parts
    /// dropped. This is the text embedded for hybrid ranking and tokenized for
    /// lexical ranking.
    fn combined_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(2 + self.keywords().len());
        parts.push(self.label());
        if let Some(description) = self.description() {
            parts.push(description);
        }
        parts.extend(self.keywords().iter().map(String::as_str));
        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Searchable for SearchItem {
    fn label(&self) -> &str {
        &self.label
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// An item paired with its fused relevance score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem<T> {
    pub item: T,
    pub score: f32,
}

/// A contiguous, offset-tagged span of a source text.
///
/// Invariant: `start_offset < end_offset <= source.len()` and
/// `text == source[start_offset..end_offset]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Relevance in `[0, 1]`; `0.0` until the chunk has been ranked.
    #[serde(default)]
    pub score: f32,
}

/// One run of a highlighted rendering. Concatenating every segment's `text`
/// in order reproduces the source text exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightedSegment {
    pub text: String,
    pub is_highlight: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl HighlightedSegment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_highlight: false,
            score: None,
        }
    }

    pub fn highlight(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            is_highlight: true,
            score: Some(score),
        }
    }
}

/// How a source text is split into chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    /// Runs of text terminated by `.`, `!` or `?`.
    #[default]
    Sentences,
    /// Blocks separated by two or more newlines.
    Paragraphs,
}

impl ChunkStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sentences => "sentences",
            Self::Paragraphs => "paragraphs",
        }
    }
}

impl fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentences" | "sentence" => Ok(Self::Sentences),
            "paragraphs" | "paragraph" => Ok(Self::Paragraphs),
            other => Err(format!(
                "unknown chunk strategy '{other}' (expected 'sentences' or 'paragraphs')"
            )),
        }
    }
}
