//! Embedding similarity fused with keyword heuristics.
//!
//! One batch call embeds the query together with every candidate. Items get a
//! keyword boost on top of cosine similarity; chunks use cosine similarity
//! alone. Final scores are clamped into `[0, 1]` and sorted descending with
//! ties kept in input order.

use super::sort_by_score_desc;
use crate::embed::Embedder;
use crate::error::SearchError;
use crate::similarity::cosine_similarity;
use crate::text::tokenize;
use glean_core::{RankedItem, Searchable, TextChunk};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Boost when the label contains the whole query.
pub const LABEL_MATCH_BOOST: f32 = 0.3;
/// Boost when any keyword contains the whole query.
pub const KEYWORD_MATCH_BOOST: f32 = 0.25;
/// Boost when any query word occurs in the combined item text.
pub const TOKEN_MATCH_BOOST: f32 = 0.15;

/// Embed `query` followed by `texts` in one call.
///
/// Returns the query vector and one vector per text. Cancellation before or
/// during the call yields [`SearchError::Cancelled`] and nothing else.
pub(crate) async fn embed_query_and_candidates(
    embedder: &dyn Embedder,
    query: &str,
    texts: &[String],
    cancel: &CancellationToken,
) -> Result<(Vec<f32>, Vec<Vec<f32>>), SearchError> {
    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let mut batch = Vec::with_capacity(texts.len() + 1);
    batch.push(query.to_owned());
    batch.extend_from_slice(texts);

    let mut vectors = tokio::select! {
        biased;

        () = cancel.cancelled() => return Err(SearchError::Cancelled),

        result = embedder.embed_batch(&batch, cancel) => result?,
    };

    if cancel.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    if vectors.len() != batch.len() {
        return Err(SearchError::InvalidEmbeddingResponse(format!(
            "expected {} vectors, got {}",
            batch.len(),
            vectors.len()
        )));
    }

    let candidates = vectors.split_off(1);
    let query_vector = vectors.pop().unwrap_or_default();
    if query_vector.is_empty() {
        return Err(SearchError::InvalidEmbeddingResponse(
            "query embedding is empty".to_string(),
        ));
    }

    Ok((query_vector, candidates))
}

/// Rank items by cosine similarity plus [`keyword_boost`].
pub async fn rank_items_hybrid<T>(
    embedder: &dyn Embedder,
    query: &str,
    items: &[T],
    cancel: &CancellationToken,
) -> Result<Vec<RankedItem<T>>, SearchError>
where
    T: Searchable + Clone + Sync,
{
    let texts: Vec<String> = items.iter().map(Searchable::combined_text).collect();
    let (query_vector, vectors) =
        embed_query_and_candidates(embedder, query, &texts, cancel).await?;

    let query_lower = query.trim().to_lowercase();
    let query_tokens = tokenize(query);

    let mut ranked: Vec<RankedItem<T>> = items
        .iter()
        .zip(texts.iter())
        .enumerate()
        .map(|(idx, (item, text))| {
            let embedding_score = vectors
                .get(idx)
                .map_or(0.0, |vector| cosine_similarity(&query_vector, vector));
            let boost = keyword_boost(&query_lower, &query_tokens, item, &text.to_lowercase());
            RankedItem {
                item: item.clone(),
                score: (embedding_score + boost).clamp(0.0, 1.0),
            }
        })
        .collect();

    sort_by_score_desc(&mut ranked, |r| r.score);
    debug!(candidates = ranked.len(), "hybrid item ranking complete");
    Ok(ranked)
}

/// Score chunks by cosine similarity to the query. No keyword boost.
pub async fn rank_chunks_hybrid(
    embedder: &dyn Embedder,
    query: &str,
    chunks: Vec<TextChunk>,
    cancel: &CancellationToken,
) -> Result<Vec<TextChunk>, SearchError> {
    let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
    let (query_vector, vectors) =
        embed_query_and_candidates(embedder, query, &texts, cancel).await?;

    let mut scored: Vec<TextChunk> = chunks
        .into_iter()
        .enumerate()
        .map(|(idx, mut chunk)| {
            chunk.score = vectors
                .get(idx)
                .map_or(0.0, |vector| cosine_similarity(&query_vector, vector))
                .clamp(0.0, 1.0);
            chunk
        })
        .collect();

    sort_by_score_desc(&mut scored, |c| c.score);
    Ok(scored)
}

/// Keyword boost for one item. First matching rule wins; boosts never stack.
///
/// `query_lower` is the trimmed, lowercased query; `combined_lower` the
/// lowercased combined item text.
///
/// An empty query earns no boost even though every label contains the empty
/// string, so a blank query ranks by similarity alone.
#[must_use]
pub fn keyword_boost<T: Searchable + ?Sized>(
    query_lower: &str,
    query_tokens: &[String],
    item: &T,
    combined_lower: &str,
) -> f32 {
    if query_lower.is_empty() {
        return 0.0;
    }
    if item.label().to_lowercase().contains(query_lower) {
        return LABEL_MATCH_BOOST;
    }
    if item
        .keywords()
        .iter()
        .any(|keyword| keyword.to_lowercase().contains(query_lower))
    {
        return KEYWORD_MATCH_BOOST;
    }
    if query_tokens
        .iter()
        .any(|token| combined_lower.contains(token.as_str()))
    {
        return TOKEN_MATCH_BOOST;
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbedError;
    use async_trait::async_trait;
    use glean_core::SearchItem;

    /// Returns a fixed list of vectors regardless of input.
    struct FixedEmbedder(Vec<Vec<f32>>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed_batch(
            &self,
            _texts: &[String],
            _cancel: &CancellationToken,
        ) -> Result<Vec<Vec<f32>>, EmbedError> {
            Ok(self.0.clone())
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn boost_priority_label_then_keyword_then_token() {
        let by_label = SearchItem::new("1", "Open Recent");
        let by_keyword = SearchItem::new("2", "Files").with_keywords(["recently used"]);
        let by_token = SearchItem::new("3", "History").with_description("show recent items");
        let none = SearchItem::new("4", "Quit");

        let score = |item: &SearchItem, query: &str| {
            keyword_boost(
                &query.to_lowercase(),
                &tokenize(query),
                item,
                &item.combined_text().to_lowercase(),
            )
        };

        assert!(approx(score(&by_label, "recent"), LABEL_MATCH_BOOST));
        assert!(approx(score(&by_keyword, "recent"), KEYWORD_MATCH_BOOST));
        assert!(approx(score(&by_token, "recent stuff"), TOKEN_MATCH_BOOST));
        assert!(approx(score(&none, "recent"), 0.0));
    }

    #[test]
    fn empty_query_gets_no_boost() {
        let item = SearchItem::new("1", "Anything");
        assert!(approx(keyword_boost("", &[], &item, "anything"), 0.0));
    }

    #[tokio::test]
    async fn hybrid_items_fuse_and_clamp() {
        let items = vec![SearchItem::new("a", "Print"), SearchItem::new("b", "Save file")];
        // query, "Print", "Save file"
        let embedder = FixedEmbedder(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]]);
        let ranked = rank_items_hybrid(&embedder, "save", &items, &CancellationToken::new())
            .await
            .expect("ranking should succeed");

        assert_eq!(ranked[0].item.id, "b");
        assert!(approx(ranked[0].score, 1.0), "1.0 + 0.3 clamps to 1.0");
        assert_eq!(ranked[1].item.id, "a");
        assert!(approx(ranked[1].score, 0.0));
    }

    #[tokio::test]
    async fn negative_similarity_clamps_to_zero() {
        let items = vec![SearchItem::new("a", "Alpha")];
        let embedder = FixedEmbedder(vec![vec![1.0, 0.0], vec![-1.0, 0.0]]);
        let ranked = rank_items_hybrid(&embedder, "zzz", &items, &CancellationToken::new())
            .await
            .expect("ranking should succeed");
        assert!(approx(ranked[0].score, 0.0));
    }

    #[tokio::test]
    async fn vector_count_mismatch_is_invalid_response() {
        let items = vec![SearchItem::new("a", "Alpha"), SearchItem::new("b", "Beta")];
        let embedder = FixedEmbedder(vec![vec![1.0], vec![1.0]]);
        let err = rank_items_hybrid(&embedder, "q", &items, &CancellationToken::new())
            .await
            .expect_err("mismatch must fail");
        assert!(matches!(err, SearchError::InvalidEmbeddingResponse(_)));
    }

    #[tokio::test]
    async fn empty_query_vector_is_invalid_response() {
        let chunks = vec![TextChunk {
            text: "x".into(),
            start_offset: 0,
            end_offset: 1,
            score: 0.0,
        }];
        let embedder = FixedEmbedder(vec![vec![], vec![1.0]]);
        let err = rank_chunks_hybrid(&embedder, "q", chunks, &CancellationToken::new())
            .await
            .expect_err("empty query vector must fail");
        assert!(matches!(err, SearchError::InvalidEmbeddingResponse(_)));
    }

    #[tokio::test]
    async fn pre_cancelled_token_skips_backend() {
        let token = CancellationToken::new();
        token.cancel();
        let embedder = FixedEmbedder(vec![]);
        let err = rank_chunks_hybrid(&embedder, "q", Vec::new(), &token)
            .await
            .expect_err("cancelled");
        assert!(err.is_cancellation());
    }

    #[tokio::test]
    async fn chunk_ties_keep_input_order() {
        let chunk = |text: &str, start: usize| TextChunk {
            text: text.into(),
            start_offset: start,
            end_offset: start + text.len(),
            score: 0.0,
        };
        let chunks = vec![chunk("one.", 0), chunk("two.", 5), chunk("three.", 10)];
        let embedder = FixedEmbedder(vec![
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]);
        let ranked = rank_chunks_hybrid(&embedder, "q", chunks, &CancellationToken::new())
            .await
            .expect("ranking should succeed");
        let order: Vec<&str> = ranked.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(order, ["two.", "one.", "three."]);
    }
}
