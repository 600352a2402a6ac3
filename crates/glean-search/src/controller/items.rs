//! Ranked selection from a list of items (command palettes, pickers).

use super::{ControllerConfig, QueryBackend, QueryController};
use crate::error::SearchError;
use crate::rank::Ranker;
use async_trait::async_trait;
use glean_core::{RankedItem, Searchable};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Ranks an item list. Always available: without an embedding backend the
/// ranker scores lexically.
pub struct ItemSearch<T> {
    ranker: Ranker,
    limit: Option<usize>,
    _items: PhantomData<fn() -> T>,
}

impl<T> ItemSearch<T> {
    #[must_use]
    pub const fn new(ranker: Ranker) -> Self {
        Self {
            ranker,
            limit: None,
            _items: PhantomData,
        }
    }

    /// Keep only the best `limit` items.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl<T> fmt::Debug for ItemSearch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemSearch")
            .field("ranker", &self.ranker)
            .field("limit", &self.limit)
            .finish()
    }
}

#[async_trait]
impl<T> QueryBackend for ItemSearch<T>
where
    T: Searchable + Clone + PartialEq + Send + Sync + 'static,
{
    type Input = Arc<[T]>;
    type Output = Vec<RankedItem<T>>;

    fn is_available(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        query: &str,
        input: &Arc<[T]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedItem<T>>, SearchError> {
        let mut ranked = self.ranker.rank_items(query, input, Some(cancel)).await?;
        if let Some(limit) = self.limit {
            ranked.truncate(limit);
        }
        Ok(ranked)
    }
}

/// Debounced ranking over a replaceable item list.
pub type ItemSelectController<T> = QueryController<ItemSearch<T>>;

impl<T> QueryController<ItemSearch<T>>
where
    T: Searchable + Clone + PartialEq + Send + Sync + 'static,
{
    #[must_use]
    pub fn for_items(
        ranker: Ranker,
        config: ControllerConfig,
        items: impl Into<Arc<[T]>>,
    ) -> Self {
        Self::new(ItemSearch::new(ranker), config, items.into())
    }

    /// Replace the item list. The current query is ranked again after the
    /// debounce. An equal list keeps the committed ranking.
    pub fn set_items(&self, items: impl Into<Arc<[T]>>) {
        self.replace_input(items.into());
    }

    #[must_use]
    pub fn items(&self) -> Arc<[T]> {
        self.input()
    }
}
