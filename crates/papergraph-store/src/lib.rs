//! # papergraph-store
//!
//! Durable similarity-result storage, pagination, and graph export.
//!
//! This crate provides:
//! - Atomic persistence of a [`SimilarityMap`] as an ordered JSON array
//! - Offset-based pagination over the map, plus the page envelope used by
//!   result-retrieval callers
//! - Derivation of a deduplicated node/edge graph from persisted results
//!
//! [`SimilarityMap`]: papergraph_core::SimilarityMap

pub mod graph;
pub mod results;

// Re-export core types
pub use papergraph_core::*;

pub use graph::build_graph;
pub use results::{load_results, page, paginate, save_results, ResultPage};
