//! # papergraph-index
//!
//! Embedding ingestion and the on-disk cosine-similarity vector index.
//!
//! This crate provides:
//! - A newline-delimited JSON parser producing typed paper records
//! - A segment-based vector index with bulk rebuild and append
//! - k-nearest-neighbor queries by cosine similarity over a consistent
//!   snapshot
//!
//! ## Example
//!
//! ```ignore
//! use papergraph_index::{parse_embeddings, VectorIndex};
//!
//! let papers = parse_embeddings("data/paper.txt.json")?;
//! let index = VectorIndex::new("data/index");
//! index.rebuild(&papers, true)?;
//!
//! let reader = index.reader()?;
//! let neighbors = reader.search(&papers[0].embedding, 10)?;
//! ```

pub mod index;
pub mod parse;

// Re-export core types
pub use papergraph_core::*;

pub use index::{cosine_similarity, IndexReader, VectorIndex};
pub use parse::parse_embeddings;
