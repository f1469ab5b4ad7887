//! Corpus indexing: normalization, chunking, embedding, and the vector index.
//!
//! Source files are scrubbed of comments and docstrings, split into
//! line-aligned chunks (with overlapping token windows for oversized lines),
//! embedded by an external service, and appended to an exact
//! nearest-neighbor index whose vectors and metadata are kept as parallel
//! arrays.

pub mod chunker;
pub mod corpus;
pub mod embedding;
pub mod language;
pub mod normalize;
pub mod pipeline;
pub mod store;
