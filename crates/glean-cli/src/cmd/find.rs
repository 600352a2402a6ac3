//! `gl find`: Passage search within one document.
//!
//! Splits the document into sentences or paragraphs, ranks them against the
//! query by embedding similarity, and prints the best passages. With
//! `--highlight` the whole document is printed with the matches marked.

use super::{build_ranker, read_input, require_query, require_semantic, search_failed};
use crate::output::{OutputMode, Render, emit, heading};
use clap::Args;
use glean_core::config::GleanConfig;
use glean_core::{ChunkStrategy, HighlightedSegment, TextChunk};
use glean_search::{ChunkOptions, project_highlights};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

const ANSI_HIGHLIGHT: &str = "\x1b[1;33m";
const ANSI_RESET: &str = "\x1b[0m";

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Free-text query.
    pub query: String,

    /// Document to search. `-` reads stdin.
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    /// Split on blank lines instead of sentence terminators.
    #[arg(long)]
    pub paragraphs: bool,

    /// Maximum number of passages (default from `[search] max_results`).
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Drop passages scoring below this (default from `[search] min_score`).
    #[arg(long, value_name = "SCORE")]
    pub min_score: Option<f32>,

    /// Print the whole document with matching passages highlighted.
    #[arg(long)]
    pub highlight: bool,
}

impl FindArgs {
    fn chunk_options(&self, config: &GleanConfig) -> ChunkOptions {
        let mut options = ChunkOptions::from(&config.search);
        if self.paragraphs {
            options.strategy = ChunkStrategy::Paragraphs;
        }
        if let Some(limit) = self.limit {
            options.max_results = limit;
        }
        if let Some(min_score) = self.min_score {
            options.min_score = min_score;
        }
        options
    }
}

/// JSON envelope for find output.
#[derive(Debug, Serialize)]
pub struct FindOutput {
    pub query: String,
    pub strategy: ChunkStrategy,
    pub count: usize,
    /// Best passage first.
    pub passages: Vec<TextChunk>,
    /// Whole-document rendering, present with `--highlight`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<HighlightedSegment>>,
}

/// Execute `gl find <query> --file <file>`.
///
/// # Errors
///
/// Returns an error if the query is blank, the document is unreadable, no
/// embedding backend is configured, or the backend fails.
pub async fn run_find(
    args: &FindArgs,
    config: &GleanConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    require_query(output, &args.query)?;
    let text = read_input(&args.file)?;
    let ranker = build_ranker(config)?;
    require_semantic(output, &ranker)?;

    let options = args.chunk_options(config);
    let passages = ranker
        .rank_text_chunks(&args.query, &text, &options, None)
        .await
        .map_err(|err| search_failed(output, &err))?;

    let segments = args
        .highlight
        .then(|| project_highlights(&text, &passages));

    let report = FindOutput {
        query: args.query.clone(),
        strategy: options.strategy,
        count: passages.len(),
        passages,
        segments,
    };

    emit(output, &report)
}

impl Render for FindOutput {
    fn text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if let Some(segments) = &self.segments {
            return write_segments(w, segments, "[[", "]]");
        }
        for chunk in &self.passages {
            writeln!(
                w,
                "{:.3}  {}..{}  {}",
                chunk.score,
                chunk.start_offset,
                chunk.end_offset,
                single_line(&chunk.text)
            )?;
        }
        Ok(())
    }

    fn pretty(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if let Some(segments) = &self.segments {
            write_segments(w, segments, ANSI_HIGHLIGHT, ANSI_RESET)?;
            return writeln!(w);
        }
        heading(
            w,
            &format!(
                "{} passage(s) for \"{}\" ({})",
                self.count, self.query, self.strategy
            ),
        )?;
        if self.passages.is_empty() {
            return writeln!(w, "No passages above the score threshold.");
        }
        for (rank, chunk) in self.passages.iter().enumerate() {
            writeln!(
                w,
                "{:>3}. ({:.3}) bytes {}..{}",
                rank + 1,
                chunk.score,
                chunk.start_offset,
                chunk.end_offset
            )?;
            writeln!(w, "     {}", single_line(&chunk.text))?;
        }
        Ok(())
    }
}

fn write_segments(
    w: &mut dyn Write,
    segments: &[HighlightedSegment],
    open: &str,
    close: &str,
) -> std::io::Result<()> {
    for segment in segments {
        if segment.is_highlight {
            write!(w, "{open}{}{close}", segment.text)?;
        } else {
            write!(w, "{}", segment.text)?;
        }
    }
    Ok(())
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
