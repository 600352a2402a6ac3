//! Passage search over one source text.

use super::{ControllerConfig, QueryBackend, QueryController};
use crate::error::SearchError;
use crate::highlight::project_highlights;
use crate::rank::{ChunkOptions, Ranker};
use async_trait::async_trait;
use glean_core::{HighlightedSegment, TextChunk};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Ranks chunks of the source text. Unavailable without an embedding backend.
#[derive(Debug, Clone)]
pub struct TextChunkSearch {
    ranker: Ranker,
    options: ChunkOptions,
}

impl TextChunkSearch {
    #[must_use]
    pub const fn new(ranker: Ranker, options: ChunkOptions) -> Self {
        Self { ranker, options }
    }

    #[must_use]
    pub const fn options(&self) -> &ChunkOptions {
        &self.options
    }
}

#[async_trait]
impl QueryBackend for TextChunkSearch {
    type Input = Arc<str>;
    type Output = Vec<TextChunk>;

    fn is_available(&self) -> bool {
        self.ranker.is_semantic()
    }

    async fn execute(
        &self,
        query: &str,
        input: &Arc<str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<TextChunk>, SearchError> {
        self.ranker
            .rank_text_chunks(query, input, &self.options, Some(cancel))
            .await
    }
}

/// Debounced passage search over a replaceable source text.
pub type TextSearchController = QueryController<TextChunkSearch>;

impl QueryController<TextChunkSearch> {
    /// Controller over `text`, with no query yet.
    #[must_use]
    pub fn for_text(
        ranker: Ranker,
        options: ChunkOptions,
        config: ControllerConfig,
        text: impl Into<Arc<str>>,
    ) -> Self {
        Self::new(TextChunkSearch::new(ranker, options), config, text.into())
    }

    /// Replace the source text. The current query is searched again after
    /// the debounce. Identical text is a no-op and keeps the committed
    /// results.
    pub fn set_text(&self, text: impl Into<Arc<str>>) {
        self.replace_input(text.into());
    }

    #[must_use]
    pub fn text(&self) -> Arc<str> {
        self.input()
    }

    /// The current text split into plain and highlighted segments.
    ///
    /// Committed chunks only highlight the text they were computed from; after
    /// [`set_text`](Self::set_text) the whole new text is one plain segment
    /// until the next search commits.
    #[must_use]
    pub fn highlights(&self) -> Vec<HighlightedSegment> {
        let state = self.inner.state.lock();
        let current = state
            .last_completed
            .as_ref()
            .is_some_and(|key| key.input_revision == state.input_revision);
        if current {
            project_highlights(&state.input, &state.results)
        } else {
            project_highlights(&state.input, &[])
        }
    }
}
