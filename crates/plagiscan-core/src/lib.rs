//! Core types, configuration, and error handling for plagiscan.
//!
//! This crate provides the shared foundation used by the other plagiscan crates:
//! - [`PlagiscanError`]: unified error type using `thiserror`
//! - [`PlagiscanConfig`]: configuration loaded from `.plagiscan.toml`
//! - Shared types: [`Verdict`], [`CheckReport`], [`ChunkRecord`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{
    CorpusConfig, DetectConfig, EmbeddingConfig, IndexConfig, LlmConfig, PlagiscanConfig,
};
pub use error::PlagiscanError;
pub use types::{CheckReport, ChunkRecord, OutputFormat, Verdict};

/// A convenience `Result` type for plagiscan operations.
pub type Result<T> = std::result::Result<T, PlagiscanError>;
