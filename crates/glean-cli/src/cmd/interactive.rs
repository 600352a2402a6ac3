//! `gl interactive`: Live passage search driven by stdin.
//!
//! Each input line replaces the query, as if typed into a search box. Lines go
//! through the debounced text-search controller, so a burst of lines only
//! searches the last one. Every committed result set is printed once; at end
//! of input the pending query is searched immediately.

use super::{build_ranker, read_input, require_semantic};
use crate::output::OutputMode;
use clap::Args;
use glean_core::config::GleanConfig;
use glean_core::{ChunkStrategy, TextChunk};
use glean_search::{
    ChunkOptions, ControllerConfig, Phase, SearchSnapshot, TextSearchController,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Args, Debug)]
pub struct InteractiveArgs {
    /// Document to search.
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    /// Split on blank lines instead of sentence terminators.
    #[arg(long)]
    pub paragraphs: bool,
}

/// One printed result set (a JSON line in JSON mode).
#[derive(Debug, Serialize, PartialEq)]
pub struct SessionUpdate {
    pub query: String,
    pub passages: Vec<TextChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionUpdate {
    fn from_snapshot(snapshot: &SearchSnapshot<Vec<TextChunk>>) -> Option<Self> {
        if snapshot.phase != Phase::Idle {
            return None;
        }
        if snapshot.results.is_empty() && snapshot.error.is_none() {
            return None;
        }
        Some(Self {
            query: snapshot.query.clone(),
            passages: snapshot.results.clone(),
            error: snapshot.error.as_ref().map(ToString::to_string),
        })
    }
}

/// Execute `gl interactive --file <file>`.
///
/// # Errors
///
/// Returns an error if the document is unreadable, no embedding backend is
/// configured, or stdin/stdout fail.
pub async fn run_interactive(
    args: &InteractiveArgs,
    config: &GleanConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    if args.file == Path::new("-") {
        anyhow::bail!("stdin carries the queries; pass the document as a file path");
    }
    let text = read_input(&args.file)?;
    let ranker = build_ranker(config)?;
    require_semantic(output, &ranker)?;

    let mut options = ChunkOptions::from(&config.search);
    if args.paragraphs {
        options.strategy = ChunkStrategy::Paragraphs;
    }

    let controller = TextSearchController::for_text(
        ranker,
        options,
        ControllerConfig::from(&config.text_search),
        text,
    );
    let mut updates = controller.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_printed: Option<SessionUpdate> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                debug!(query = %line.trim(), "query line");
                controller.set_query(line.trim());
            }
            changed = updates.changed() => {
                changed?;
                let snapshot = updates.borrow_and_update().clone();
                print_if_new(output, &snapshot, &mut last_printed)?;
            }
        }
    }

    controller.search(None).await;
    print_if_new(output, &controller.snapshot(), &mut last_printed)?;
    controller.dispose();
    Ok(())
}

fn print_if_new(
    output: OutputMode,
    snapshot: &SearchSnapshot<Vec<TextChunk>>,
    last_printed: &mut Option<SessionUpdate>,
) -> anyhow::Result<()> {
    let Some(update) = SessionUpdate::from_snapshot(snapshot) else {
        return Ok(());
    };
    if last_printed.as_ref() == Some(&update) {
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_update(&mut out, output, &update)?;
    out.flush()?;
    *last_printed = Some(update);
    Ok(())
}

fn write_update(
    out: &mut dyn Write,
    output: OutputMode,
    update: &SessionUpdate,
) -> anyhow::Result<()> {
    match output {
        OutputMode::Json => {
            serde_json::to_writer(&mut *out, update)?;
            writeln!(out)?;
        }
        OutputMode::Text | OutputMode::Pretty => {
            writeln!(out, "> {}", update.query)?;
            if let Some(error) = &update.error {
                writeln!(out, "error: {error}")?;
            }
            for chunk in &update.passages {
                writeln!(
                    out,
                    "{:.3}  {}..{}  {}",
                    chunk.score, chunk.start_offset, chunk.end_offset, chunk.text
                )?;
            }
        }
    }
    Ok(())
}
