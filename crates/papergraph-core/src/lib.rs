//! # papergraph-core
//!
//! Core types, errors, and defaults for the papergraph library.
//!
//! This crate provides the foundational data structures that the other
//! papergraph crates depend on: the paper record types, the ordered
//! similarity map, the job vocabulary (handles, kinds, outputs, statuses),
//! the graph export shape, and the shared error type.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod logging;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::write_atomic;
pub use models::*;
