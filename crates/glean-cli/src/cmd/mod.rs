pub mod find;
pub mod interactive;
pub mod rank;

use crate::output::{Failure, OutputMode};
use anyhow::Context;
use glean_core::ErrorCode;
use glean_core::config::GleanConfig;
use glean_search::{Ranker, SearchError, embedder_from_config};
use std::io::Read;
use std::path::Path;

/// Build the ranker described by `[search]` and `[embedder]`.
pub fn build_ranker(config: &GleanConfig) -> anyhow::Result<Ranker> {
    let embedder = embedder_from_config(&config.search, &config.embedder)
        .context("failed to initialize embedding backend")?;
    Ok(Ranker::new(embedder))
}

/// Read a whole input file; `-` reads stdin.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Show `failure` on stderr, then fail the command with `summary`.
pub fn fail(output: OutputMode, failure: &Failure, summary: String) -> anyhow::Error {
    match failure.report(output) {
        Ok(()) => anyhow::Error::msg(summary),
        Err(render_err) => render_err,
    }
}

pub fn search_failed(output: OutputMode, err: &SearchError) -> anyhow::Error {
    fail(
        output,
        &Failure::new(err.code(), err),
        format!("{}: {err}", err.code()),
    )
}

/// Reject blank queries before any work is done.
pub fn require_query(output: OutputMode, query: &str) -> anyhow::Result<()> {
    if !query.trim().is_empty() {
        return Ok(());
    }
    let failure = Failure {
        code: ErrorCode::InvalidInput.code(),
        message: "query must not be empty".to_string(),
        hint: Some("Pass a non-blank query string."),
    };
    Err(fail(output, &failure, "empty search query".to_string()))
}

/// Passage commands need an embedding backend.
pub fn require_semantic(output: OutputMode, ranker: &Ranker) -> anyhow::Result<()> {
    if ranker.is_semantic() {
        Ok(())
    } else {
        Err(search_failed(output, &SearchError::EmbeddingUnavailable))
    }
}
