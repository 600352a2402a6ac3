#![forbid(unsafe_code)]
//! glean-search library.
//!
//! Hybrid semantic + lexical ranking for item lists and passages of text,
//! highlight projection, and a debounced query controller for interactive
//! front ends.
//!
//! - [`rank::Ranker`] ranks items (hybrid when an [`embed::Embedder`] is
//!   configured, lexical otherwise) and passages (embedding required).
//! - [`chunk`] splits text into offset-tagged sentences or paragraphs and
//!   [`highlight`] projects ranked chunks back onto the source.
//! - [`controller::QueryController`] wraps a ranker in a session with
//!   debounce, deduplication and last-request-wins cancellation.
//!
//! # Conventions
//!
//! - **Errors**: [`SearchError`] for ranking and controller failures;
//!   `anyhow::Result` for construction and I/O.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod chunk;
pub mod controller;
pub mod embed;
pub mod error;
pub mod highlight;
pub mod rank;
pub mod similarity;
pub mod text;

pub use chunk::{chunk_by_paragraphs, chunk_by_sentences, chunk_text};
pub use controller::{
    ControllerConfig, ItemSelectController, Phase, QueryBackend, QueryController, SearchSnapshot,
    TextSearchController,
};
pub use embed::{Embedder, HashingEmbedder, embedder_from_config};
pub use error::{EmbedError, SearchError};
pub use highlight::project_highlights;
pub use rank::{ChunkOptions, Ranker};
pub use similarity::cosine_similarity;
