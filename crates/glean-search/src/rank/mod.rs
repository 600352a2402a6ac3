//! Ranking entry points.
//!
//! [`Ranker`] owns the optional embedding backend and picks a strategy:
//!
//! - items: hybrid (embedding + keyword boost) when a backend is present,
//!   lexical token overlap otherwise or when the backend fails
//! - text: chunk, embed, threshold, cap. There is no lexical-only passage
//!   search, so a missing backend is reported as an error.
//!
//! Cancellation always wins: a cancelled request returns
//! [`SearchError::Cancelled`], never a partial ranking.

pub mod hybrid;
pub mod lexical;

pub use hybrid::{keyword_boost, rank_chunks_hybrid, rank_items_hybrid};
pub use lexical::{lexical_score, rank_items_lexical};

use crate::chunk::chunk_text;
use crate::embed::Embedder;
use crate::error::SearchError;
use glean_core::config::SearchConfig;
use glean_core::{ChunkStrategy, RankedItem, Searchable, TextChunk};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Options for [`Ranker::rank_text_chunks`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkOptions {
    pub strategy: ChunkStrategy,
    pub max_results: usize,
    /// Chunks scoring below this are dropped.
    pub min_score: f32,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Sentences,
            max_results: 5,
            min_score: 0.3,
        }
    }
}

impl From<&SearchConfig> for ChunkOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            strategy: config.chunk_strategy,
            max_results: config.max_results,
            min_score: config.min_score,
        }
    }
}

/// Ranks items and passages, with or without an embedding backend.
#[derive(Clone, Default)]
pub struct Ranker {
    embedder: Option<Arc<dyn Embedder>>,
}

impl fmt::Debug for Ranker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker")
            .field("semantic", &self.is_semantic())
            .finish()
    }
}

impl Ranker {
    #[must_use]
    pub fn new(embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self { embedder }
    }

    /// A ranker with no embedding backend.
    #[must_use]
    pub fn lexical() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder: Some(embedder),
        }
    }

    /// True when an embedding backend is configured.
    #[must_use]
    pub fn is_semantic(&self) -> bool {
        self.embedder.is_some()
    }

    /// Rank `items` against `query`, best first. No length cap.
    ///
    /// Never fails for a missing or broken backend (lexical scoring takes
    /// over); the only error is [`SearchError::Cancelled`].
    #[instrument(skip_all, fields(items = items.len(), semantic = self.is_semantic()))]
    pub async fn rank_items<T>(
        &self,
        query: &str,
        items: &[T],
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<RankedItem<T>>, SearchError>
    where
        T: Searchable + Clone + Sync,
    {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let owned;
        let cancel = if let Some(token) = cancel {
            token
        } else {
            owned = CancellationToken::new();
            &owned
        };

        if let Some(embedder) = &self.embedder {
            match rank_items_hybrid(embedder.as_ref(), query, items, cancel).await {
                Ok(ranked) => return Ok(ranked),
                Err(err) if err.is_cancellation() => return Err(err),
                Err(err) => {
                    warn!("semantic ranking unavailable, falling back to lexical scoring: {err}");
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        Ok(rank_items_lexical(query, items))
    }

    /// Find the passages of `text` most relevant to `query`.
    ///
    /// Returns at most `options.max_results` chunks, all scoring at least
    /// `options.min_score`, best first.
    ///
    /// # Errors
    ///
    /// [`SearchError::EmbeddingUnavailable`] without a backend, otherwise any
    /// failure of the embedding call.
    #[instrument(skip_all, fields(text_len = text.len(), strategy = %options.strategy))]
    pub async fn rank_text_chunks(
        &self,
        query: &str,
        text: &str,
        options: &ChunkOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<TextChunk>, SearchError> {
        let Some(embedder) = &self.embedder else {
            return Err(SearchError::EmbeddingUnavailable);
        };

        let chunks = chunk_text(text, options.strategy);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let owned;
        let cancel = if let Some(token) = cancel {
            token
        } else {
            owned = CancellationToken::new();
            &owned
        };

        let total = chunks.len();
        let mut ranked = rank_chunks_hybrid(embedder.as_ref(), query, chunks, cancel).await?;
        ranked.retain(|chunk| chunk.score >= options.min_score);
        ranked.truncate(options.max_results);

        debug!(total, kept = ranked.len(), "passage ranking complete");
        Ok(ranked)
    }
}

/// Stable descending sort on an `f32` key.
pub(crate) fn sort_by_score_desc<T>(values: &mut [T], score: impl Fn(&T) -> f32) {
    values.sort_by(|a, b| score(b).total_cmp(&score(a)));
}
