#![forbid(unsafe_code)]
//! glean-core library.
//!
//! Shared data model, layered configuration and machine-readable error codes
//! used by `glean-search` and the `gl` binary.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types where appropriate.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;

pub use error::ErrorCode;
pub use model::{
    ChunkStrategy, HighlightedSegment, RankedItem, SearchItem, Searchable, TextChunk,
};
