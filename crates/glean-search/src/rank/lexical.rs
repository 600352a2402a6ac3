//! Token-overlap scoring for items when no embedding backend is available.

use super::sort_by_score_desc;
use crate::text::{tokenize, unique_tokens};
use glean_core::{RankedItem, Searchable};
use std::collections::HashSet;

/// Credit for a query token found verbatim among the item's tokens.
pub const EXACT_TOKEN_CREDIT: f32 = 1.0;
/// Credit for a query token found as a substring of the item text.
pub const SUBSTRING_CREDIT: f32 = 0.7;
/// Credit for a query token that is a prefix of an item token, or vice versa.
pub const PREFIX_CREDIT: f32 = 0.5;

/// Rank items by the mean per-token credit of the query's unique tokens.
///
/// A query with no tokens scores every item `0.0`; items are still returned
/// in their original order.
#[must_use]
pub fn rank_items_lexical<T: Searchable + Clone>(query: &str, items: &[T]) -> Vec<RankedItem<T>> {
    let query_tokens = unique_tokens(query);

    let mut ranked: Vec<RankedItem<T>> = items
        .iter()
        .map(|item| RankedItem {
            item: item.clone(),
            score: lexical_score(&query_tokens, item),
        })
        .collect();

    sort_by_score_desc(&mut ranked, |r| r.score);
    ranked
}

/// Score one item against pre-tokenized, de-duplicated query tokens.
///
/// The prefix rule over-credits very short tokens: a one-letter token on
/// either side prefix-matches almost anything. Kept as-is for score
/// compatibility.
#[must_use]
pub fn lexical_score<T: Searchable + ?Sized>(query_tokens: &[String], item: &T) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }

    let combined = item.combined_text().to_lowercase();
    let item_tokens = tokenize(&combined);
    let item_set: HashSet<&str> = item_tokens.iter().map(String::as_str).collect();

    let total: f32 = query_tokens
        .iter()
        .map(|token| token_credit(token, &combined, &item_tokens, &item_set))
        .sum();

    #[allow(clippy::cast_precision_loss)]
    let mean = total / query_tokens.len() as f32;
    mean.clamp(0.0, 1.0)
}

fn token_credit(
    token: &str,
    combined: &str,
    item_tokens: &[String],
    item_set: &HashSet<&str>,
) -> f32 {
    if item_set.contains(token) {
        return EXACT_TOKEN_CREDIT;
    }
    if combined.contains(token) {
        return SUBSTRING_CREDIT;
    }
    if item_tokens
        .iter()
        .any(|candidate| candidate.starts_with(token) || token.starts_with(candidate.as_str()))
    {
        return PREFIX_CREDIT;
    }
    0.0
}
