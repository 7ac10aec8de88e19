//! # papergraph-jobs
//!
//! Asynchronous job registry for papergraph.
//!
//! This crate provides:
//! - A registry running submitted work on a bounded worker pool
//! - Numeric handles with non-blocking status polling
//! - Completion events via broadcast channels
//! - The two background operations: index build and similarity search
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use papergraph_index::VectorIndex;
//! use papergraph_jobs::{tasks, JobKind, JobRegistry, RegistryConfig};
//!
//! let registry = JobRegistry::new(RegistryConfig::default());
//! let index = Arc::new(VectorIndex::new("data/index"));
//!
//! let id = registry
//!     .submit(
//!         JobKind::IndexBuild,
//!         tasks::index_build(index, "data/paper.txt.json".into(), true),
//!     )
//!     .await;
//!
//! // Poll until terminal
//! let status = registry.poll(id).await;
//!
//! // Graceful shutdown: drains queued jobs, then stops the workers
//! registry.shutdown().await?;
//! ```

pub mod registry;
pub mod tasks;

// Re-export core types
pub use papergraph_core::*;

pub use registry::{JobEvent, JobRegistry, RegistryConfig};
