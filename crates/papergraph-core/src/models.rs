//! Core data models for papergraph.
//!
//! These types are shared across all papergraph crates and represent the
//! paper records, the ordered similarity map, the job vocabulary, and the
//! graph export shape.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

// =============================================================================
// PAPER RECORDS
// =============================================================================

/// Full ingestion record, one per input line.
///
/// The embedding is required by type: records parsed from an input file
/// always carry a vector, and records without one are a different type
/// ([`PaperRef`]) rather than a null field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: String,
    pub title: String,
    #[serde(rename = "arxiv-id")]
    pub arxiv_id: String,
    #[serde(rename = "emb")]
    pub embedding: Vec<f32>,
}

impl Paper {
    /// Project this record to its embedding-free form.
    pub fn to_ref(&self) -> PaperRef {
        PaperRef::from(self)
    }
}

/// Projected paper record with the embedding omitted.
///
/// This is the shape returned from queries and persisted inside neighbor
/// lists. Identity is the full `(id, title, arxiv_id)` triple, which makes
/// it usable as a map key where query-result copies and ingestion-time
/// projections compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct PaperRef {
    pub id: String,
    pub title: String,
    #[serde(rename = "arxiv-id")]
    pub arxiv_id: String,
}

impl Serialize for PaperRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // The persisted wire format always carries an `emb` field, empty for
        // projected records.
        let empty: [f32; 0] = [];
        let mut s = serializer.serialize_struct("PaperRef", 4)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("title", &self.title)?;
        s.serialize_field("arxiv-id", &self.arxiv_id)?;
        s.serialize_field("emb", &empty)?;
        s.end()
    }
}

impl From<&Paper> for PaperRef {
    fn from(paper: &Paper) -> Self {
        Self {
            id: paper.id.clone(),
            title: paper.title.clone(),
            arxiv_id: paper.arxiv_id.clone(),
        }
    }
}

// =============================================================================
// SIMILARITY MAP
// =============================================================================

/// Insertion-ordered mapping from a query paper to its ranked neighbors.
///
/// Order is significant: entries come out in the order papers were submitted
/// to the search, which is what pagination slices against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityMap {
    entries: IndexMap<PaperRef, Vec<PaperRef>>,
}

impl SimilarityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a paper with its ranked neighbor list, replacing any previous
    /// entry for the same paper (position is kept on replace).
    pub fn insert(&mut self, paper: PaperRef, neighbors: Vec<PaperRef>) -> Option<Vec<PaperRef>> {
        self.entries.insert(paper, neighbors)
    }

    pub fn get(&self, paper: &PaperRef) -> Option<&[PaperRef]> {
        self.entries.get(paper).map(Vec::as_slice)
    }

    /// Entry at a position in insertion order.
    pub fn get_index(&self, index: usize) -> Option<(&PaperRef, &Vec<PaperRef>)> {
        self.entries.get_index(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, PaperRef, Vec<PaperRef>> {
        self.entries.iter()
    }

    /// Flatten to the on-disk form, preserving order.
    pub fn to_persisted(&self) -> Vec<PersistedResult> {
        self.entries
            .iter()
            .map(|(paper, neighbors)| PersistedResult {
                arxiv_id: paper.arxiv_id.clone(),
                title: paper.title.clone(),
                similars: neighbors.clone(),
            })
            .collect()
    }

    /// Rebuild from the on-disk form.
    ///
    /// The persisted shape keys entries by arXiv id and title only, so the
    /// reconstructed map keys carry an empty internal `id`.
    pub fn from_persisted(results: Vec<PersistedResult>) -> Self {
        results
            .into_iter()
            .map(|result| {
                (
                    PaperRef {
                        id: String::new(),
                        title: result.title,
                        arxiv_id: result.arxiv_id,
                    },
                    result.similars,
                )
            })
            .collect()
    }
}

impl FromIterator<(PaperRef, Vec<PaperRef>)> for SimilarityMap {
    fn from_iter<I: IntoIterator<Item = (PaperRef, Vec<PaperRef>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SimilarityMap {
    type Item = (&'a PaperRef, &'a Vec<PaperRef>);
    type IntoIter = indexmap::map::Iter<'a, PaperRef, Vec<PaperRef>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// On-disk form of one similarity map entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedResult {
    pub arxiv_id: String,
    pub title: String,
    pub similars: Vec<PaperRef>,
}

// =============================================================================
// JOB TYPES
// =============================================================================

/// Opaque numeric handle for one submitted unit of work.
///
/// Handles are minted from a monotonically increasing counter owned by the
/// registry and are never reused within a process run. They are not
/// persisted: a restart forgets every in-flight and completed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two background operations the registry runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    IndexBuild,
    Search,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexBuild => write!(f, "index_build"),
            Self::Search => write!(f, "search"),
        }
    }
}

/// Successful result of a completed job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutput {
    /// Index build finished; count of documents written in this run.
    IndexBuilt { documents: usize },
    /// Similarity search finished with the full neighbor map.
    Search(SimilarityMap),
}

/// Externally visible job state, as reported by polling.
///
/// `NotFound`, `Running`, and `Failed` are three distinct non-success
/// outcomes and are never conflated. A queued-but-unstarted job reports
/// `Running`: a poll racing the worker pool must never observe `NotFound`
/// for a handle that `submit` already returned.
#[derive(Debug, Clone)]
pub enum JobStatus {
    NotFound,
    Running,
    Completed(Arc<JobOutput>),
    Failed(String),
}

impl JobStatus {
    /// Whether the job has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

// =============================================================================
// GRAPH EXPORT
// =============================================================================

/// One graph node: an indexed paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

/// Directed similarity edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

/// Node/edge export for visualization clients.
///
/// Invariant: every link target appears among the node ids; the builder
/// drops links that would dangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}
