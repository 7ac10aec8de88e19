//! On-disk cosine-similarity vector index.
//!
//! Layout under the index root:
//!
//! ```text
//! <root>/
//!   manifest.json        committed state: dimension, doc count, segment list
//!   seg-00000001.json    JSON array of stored records, in insertion order
//! ```
//!
//! The manifest swap is the commit point. Segment files are written and
//! fsynced before the manifest references them, and are immutable once
//! referenced, so a crash after `rebuild` returns cannot lose committed
//! documents. A recreate deletes the directory and immediately commits an
//! empty manifest, leaving at worst an empty-but-valid index in the crash
//! window.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use papergraph_core::{write_atomic, Error, Paper, PaperRef, Result};

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Manifest {
    /// Embedding dimension shared by every stored vector. Zero while empty.
    dimension: usize,
    documents: usize,
    segments: Vec<String>,
    next_segment: u64,
}

/// Persisted vector index over a directory of segment files.
///
/// One rebuild at a time; rebuilds and snapshot loads are mutually
/// exclusive. Searches over an opened [`IndexReader`] run lock-free and may
/// proceed in parallel.
pub struct VectorIndex {
    root: PathBuf,
    /// Guards the directory: rebuilds exclusive, snapshot loads shared.
    gate: RwLock<()>,
}

impl VectorIndex {
    /// Create a handle over an index directory. No I/O happens until the
    /// first rebuild or reader.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            gate: RwLock::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bulk-write records into the index.
    ///
    /// With `recreate` the existing index directory is deleted in full
    /// before writing; otherwise the records are appended as a new segment
    /// without touching prior entries (no dedup is performed; avoiding
    /// duplicate ids is the caller's responsibility). Returns the number of
    /// documents written in this call.
    pub fn rebuild(&self, records: &[Paper], recreate: bool) -> Result<usize> {
        let dimension = validate_embeddings(records)?;

        // A poisoned gate means a previous writer panicked mid-call; the
        // manifest swap keeps the on-disk state valid either way.
        let _guard = self.gate.write().unwrap_or_else(PoisonError::into_inner);

        let mut manifest = if recreate {
            self.recreate_empty()?
        } else {
            match self.try_read_manifest()? {
                Some(manifest) => manifest,
                None => {
                    fs::create_dir_all(&self.root)?;
                    Manifest::default()
                }
            }
        };

        if manifest.dimension != 0 && dimension != 0 && manifest.dimension != dimension {
            return Err(Error::InvalidInput(format!(
                "embedding dimension {dimension} does not match index dimension {}",
                manifest.dimension
            )));
        }

        if records.is_empty() {
            // Nothing to write, but an append onto a fresh directory still
            // commits an empty manifest so the index becomes readable.
            self.write_manifest(&manifest)?;
            return Ok(0);
        }

        manifest.next_segment += 1;
        let segment = format!("seg-{:08}.json", manifest.next_segment);
        write_atomic(&self.root.join(&segment), &serde_json::to_vec(records)?)?;

        manifest.segments.push(segment);
        manifest.documents += records.len();
        if manifest.dimension == 0 {
            manifest.dimension = dimension;
        }
        self.write_manifest(&manifest)?;

        info!(
            documents = records.len(),
            total = manifest.documents,
            "wrote documents to index"
        );
        Ok(records.len())
    }

    /// Load a consistent snapshot of the committed index.
    ///
    /// A reader opened after a rebuild commits sees the new index; one
    /// opened during a recreate sees the old index, the committed empty one,
    /// or fails, never a torn view.
    pub fn reader(&self) -> Result<IndexReader> {
        let _guard = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let manifest = self.try_read_manifest()?.ok_or_else(|| {
            Error::IndexUnavailable(format!("no index at {}", self.root.display()))
        })?;

        let mut docs = Vec::with_capacity(manifest.documents);
        for segment in &manifest.segments {
            let path = self.root.join(segment);
            let bytes = fs::read(&path).map_err(|e| {
                Error::IndexUnavailable(format!("unreadable segment {}: {e}", path.display()))
            })?;
            let papers: Vec<Paper> = serde_json::from_slice(&bytes).map_err(|e| {
                Error::IndexUnavailable(format!("corrupt segment {}: {e}", path.display()))
            })?;
            docs.extend(papers);
        }

        debug!(
            documents = docs.len(),
            segments = manifest.segments.len(),
            "opened index reader"
        );
        Ok(IndexReader {
            dimension: manifest.dimension,
            docs,
        })
    }

    /// One-off k-NN query against a fresh snapshot.
    pub fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<PaperRef>> {
        self.reader()?.search(embedding, k)
    }

    fn recreate_empty(&self) -> Result<Manifest> {
        if self.root.exists() {
            info!(path = %self.root.display(), "deleting index");
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        let manifest = Manifest::default();
        self.write_manifest(&manifest)?;
        Ok(manifest)
    }

    /// Committed manifest if one exists. A missing file means no index has
    /// been built here yet; a present-but-unreadable one is an error.
    fn try_read_manifest(&self) -> Result<Option<Manifest>> {
        let path = self.root.join(MANIFEST_FILE);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::IndexUnavailable(format!(
                    "unreadable manifest at {}: {e}",
                    path.display()
                )))
            }
        };
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            Error::IndexUnavailable(format!("corrupt manifest at {}: {e}", path.display()))
        })
    }

    fn write_manifest(&self, manifest: &Manifest) -> Result<()> {
        write_atomic(
            &self.root.join(MANIFEST_FILE),
            &serde_json::to_vec(manifest)?,
        )
    }
}

/// In-memory snapshot of a committed index state.
#[derive(Debug)]
pub struct IndexReader {
    dimension: usize,
    docs: Vec<Paper>,
}

impl IndexReader {
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Return the stored records closest to `embedding` by cosine
    /// similarity, ranked descending, at most `k` of them.
    ///
    /// Ties resolve to the earlier insertion, so results are deterministic
    /// for a fixed index state. Returned records carry no embedding.
    pub fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<PaperRef>> {
        if k == 0 {
            return Err(Error::InvalidInput("k must be at least 1".to_string()));
        }
        if self.docs.is_empty() {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimension {
            return Err(Error::InvalidInput(format!(
                "query dimension {} does not match index dimension {}",
                embedding.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .docs
            .iter()
            .enumerate()
            .map(|(ord, doc)| (ord, cosine_similarity(embedding, &doc.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(ord, _)| PaperRef::from(&self.docs[ord]))
            .collect())
    }
}

/// Cosine similarity between two equal-length vectors.
///
/// Zero-magnitude inputs score 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn validate_embeddings(records: &[Paper]) -> Result<usize> {
    let mut dimension = 0usize;
    for paper in records {
        if paper.embedding.is_empty() {
            return Err(Error::MissingEmbedding(paper.id.clone()));
        }
        if dimension == 0 {
            dimension = paper.embedding.len();
        } else if paper.embedding.len() != dimension {
            return Err(Error::InvalidInput(format!(
                "embedding dimension {} for record {} does not match {dimension}",
                paper.embedding.len(),
                paper.id
            )));
        }
    }
    Ok(dimension)
}
