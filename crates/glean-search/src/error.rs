//! Failure taxonomy for ranking and query control.

use glean_core::ErrorCode;
use std::sync::Arc;

/// Errors produced by the rankers and surfaced by the query controller.
///
/// `Clone` so the controller can keep the most recent failure visible.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// The request was superseded or explicitly aborted.
    #[error("search cancelled")]
    Cancelled,

    /// Passage search was requested without an embedding backend.
    #[error("no embedding backend is configured")]
    EmbeddingUnavailable,

    /// The backend answered with the wrong number of vectors or an empty
    /// query vector.
    #[error("invalid embedding response: {0}")]
    InvalidEmbeddingResponse(String),

    /// The backend call failed for any other reason.
    #[error("embedding backend failed: {0:#}")]
    BackendFailure(Arc<anyhow::Error>),
}

impl SearchError {
    /// True for the one kind the controller swallows instead of surfacing.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Cancelled => ErrorCode::SearchCancelled,
            Self::EmbeddingUnavailable => ErrorCode::EmbeddingUnavailable,
            Self::InvalidEmbeddingResponse(_) => ErrorCode::InvalidEmbeddingResponse,
            Self::BackendFailure(_) => ErrorCode::EmbeddingBackendFailure,
        }
    }

    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::BackendFailure(Arc::new(err.into()))
    }
}

/// Errors reported by an [`Embedder`](crate::embed::Embedder).
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// The cancellation token fired before the backend answered.
    #[error("embedding request cancelled")]
    Cancelled,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<EmbedError> for SearchError {
    fn from(err: EmbedError) -> Self {
        match err {
            EmbedError::Cancelled => Self::Cancelled,
            EmbedError::Backend(err) => Self::BackendFailure(Arc::new(err)),
        }
    }
}
