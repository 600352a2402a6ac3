//! The embedding collaborator and the backends shipped with glean.
//!
//! The rankers only need "batch of texts in, batch of vectors out"; model
//! loading, tokenization and inference live behind [`Embedder`].

mod hashing;
#[cfg(feature = "ollama")]
mod ollama;

pub use hashing::HashingEmbedder;
#[cfg(feature = "ollama")]
pub use ollama::OllamaEmbedder;

use crate::error::EmbedError;
use anyhow::Result;
use async_trait::async_trait;
use glean_core::config::{EmbedderConfig, EmbedderProvider, SearchConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Batch text-to-vector backend.
///
/// Implementations must return exactly one vector per input text, in input
/// order, and should resolve promptly with [`EmbedError::Cancelled`] once
/// `cancel` fires. Callers tolerate a late answer after cancellation and
/// discard it.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<f32>>, EmbedError>;
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    async fn embed_batch(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        (**self).embed_batch(texts, cancel).await
    }
}

/// Build the configured backend, or `None` when semantic search is disabled.
///
/// A missing backend is a normal state: item ranking falls back to lexical
/// scoring and passage search reports `EmbeddingUnavailable`.
pub fn embedder_from_config(
    search: &SearchConfig,
    config: &EmbedderConfig,
) -> Result<Option<Arc<dyn Embedder>>> {
    if !search.semantic {
        debug!("semantic search disabled by config");
        return Ok(None);
    }

    match config.provider {
        EmbedderProvider::None => Ok(None),
        EmbedderProvider::Hashing => Ok(Some(Arc::new(HashingEmbedder::new(config.dimensions)))),
        EmbedderProvider::Ollama => ollama_from_config(config),
    }
}

#[cfg(feature = "ollama")]
fn ollama_from_config(config: &EmbedderConfig) -> Result<Option<Arc<dyn Embedder>>> {
    Ok(Some(Arc::new(OllamaEmbedder::new(
        &config.base_url,
        &config.model,
        config.timeout(),
    ))))
}

#[cfg(not(feature = "ollama"))]
fn ollama_from_config(config: &EmbedderConfig) -> Result<Option<Arc<dyn Embedder>>> {
    tracing::warn!(
        "embedder provider 'ollama' ({}) requested but glean-search was built without the `ollama` feature",
        config.base_url
    );
    Ok(None)
}
