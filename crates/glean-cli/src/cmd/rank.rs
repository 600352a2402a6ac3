//! `gl rank`: Rank a list of items against a query.
//!
//! Hybrid (embedding + keyword boost) when a backend is configured, token
//! overlap otherwise. A failing backend degrades to token overlap with a
//! warning instead of failing the command.

use super::{build_ranker, fail, read_input, require_query, search_failed};
use crate::output::{Failure, OutputMode, Render, emit, heading};
use clap::Args;
use glean_core::config::GleanConfig;
use glean_core::{ErrorCode, RankedItem, SearchItem};
use glean_search::Ranker;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Free-text query.
    pub query: String,

    /// JSON file with an array of items. `-` reads stdin.
    #[arg(long, value_name = "FILE")]
    pub items: PathBuf,

    /// Maximum number of results to return.
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Skip the embedding backend and rank by token overlap.
    #[arg(long)]
    pub lexical: bool,
}

/// JSON envelope for rank output.
#[derive(Debug, Serialize)]
pub struct RankOutput {
    pub query: String,
    /// `"hybrid"` or `"lexical"`.
    pub mode: &'static str,
    pub count: usize,
    /// Best match first.
    pub results: Vec<RankedItem<SearchItem>>,
}

/// Execute `gl rank <query> --items <file>`.
///
/// # Errors
///
/// Returns an error if the query is blank, the items file is unreadable or
/// not a JSON item array, or ranking is cancelled.
pub async fn run_rank(
    args: &RankArgs,
    config: &GleanConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    require_query(output, &args.query)?;

    let items = match parse_items(&read_input(&args.items)?) {
        Ok(items) => items,
        Err(err) => {
            return Err(fail(
                output,
                &Failure::new(ErrorCode::InvalidInput, &err),
                format!("invalid items file {}: {err}", args.items.display()),
            ));
        }
    };

    let ranker = if args.lexical {
        Ranker::lexical()
    } else {
        build_ranker(config)?
    };

    let mut results = ranker
        .rank_items(&args.query, &items, None)
        .await
        .map_err(|err| search_failed(output, &err))?;
    results.truncate(args.limit);

    let report = RankOutput {
        query: args.query.clone(),
        mode: if ranker.is_semantic() { "hybrid" } else { "lexical" },
        count: results.len(),
        results,
    };

    emit(output, &report)
}

fn parse_items(raw: &str) -> Result<Vec<SearchItem>, serde_json::Error> {
    serde_json::from_str(raw)
}

impl Render for RankOutput {
    fn text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for ranked in &self.results {
            writeln!(w, "{:.3}  {}  {}", ranked.score, ranked.item.id, ranked.item.label)?;
        }
        Ok(())
    }

    fn pretty(&self, w: &mut dyn Write) -> std::io::Result<()> {
        heading(
            w,
            &format!("{} result(s) for \"{}\" ({})", self.count, self.query, self.mode),
        )?;
        if self.results.is_empty() {
            return writeln!(w, "No items.");
        }
        for (rank, ranked) in self.results.iter().enumerate() {
            writeln!(
                w,
                "{:>3}. {:<40} {:>6.3}  [{}]",
                rank + 1,
                ranked.item.label,
                ranked.score,
                ranked.item.id
            )?;
            if let Some(description) = &ranked.item.description {
                writeln!(w, "     {description}")?;
            }
        }
        Ok(())
    }
}
