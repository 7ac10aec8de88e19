//! Work units for the two background operations.
//!
//! Each constructor captures its inputs and returns the closure handed to
//! [`JobRegistry::submit`]; the closure runs on a blocking worker thread.
//!
//! [`JobRegistry::submit`]: crate::registry::JobRegistry::submit

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use papergraph_core::{JobOutput, Result, SimilarityMap};
use papergraph_index::{parse_embeddings, VectorIndex};
use papergraph_store::save_results;

/// Parse an embedding file and rebuild the index from it.
pub fn index_build(
    index: Arc<VectorIndex>,
    source: PathBuf,
    recreate: bool,
) -> impl FnOnce() -> Result<JobOutput> + Send + 'static {
    move || {
        let papers = parse_embeddings(&source)?;
        let documents = index.rebuild(&papers, recreate)?;
        Ok(JobOutput::IndexBuilt { documents })
    }
}

/// Run every parsed paper through a k-NN query and persist the ranked
/// neighbor map.
///
/// The whole batch queries one snapshot, so a rebuild committing midway
/// through the job cannot produce a mix of old and new neighborhoods. Map
/// order equals the order papers appear in the source file.
pub fn similarity_search(
    index: Arc<VectorIndex>,
    source: PathBuf,
    k: usize,
    results_path: PathBuf,
) -> impl FnOnce() -> Result<JobOutput> + Send + 'static {
    move || {
        let papers = parse_embeddings(&source)?;
        let reader = index.reader()?;

        let mut map = SimilarityMap::new();
        for paper in &papers {
            let neighbors = reader.search(&paper.embedding, k)?;
            map.insert(paper.to_ref(), neighbors);
        }

        save_results(&map, &results_path)?;
        info!(results = map.len(), "similarity search finished");
        Ok(JobOutput::Search(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use papergraph_core::Error;
    use std::io::Write;

    fn write_embeddings(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("paper.txt.json");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"id":"1","title":"A","arxiv-id":"a1","emb":[1.0,0.0]}}"#).unwrap();
        writeln!(file, r#"{{"id":"2","title":"B","arxiv-id":"a2","emb":[0.0,1.0]}}"#).unwrap();
        writeln!(file, r#"{{"id":"3","title":"C","arxiv-id":"a3","emb":[0.9,0.1]}}"#).unwrap();
        path
    }

    #[test]
    fn index_build_work_unit_writes_documents() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_embeddings(dir.path());
        let index = Arc::new(VectorIndex::new(dir.path().join("index")));

        let output = index_build(index.clone(), source, true)().unwrap();
        assert_eq!(output, JobOutput::IndexBuilt { documents: 3 });
        assert_eq!(index.reader().unwrap().len(), 3);
    }

    #[test]
    fn similarity_search_work_unit_builds_and_persists_map() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_embeddings(dir.path());
        let index = Arc::new(VectorIndex::new(dir.path().join("index")));
        index_build(index.clone(), source.clone(), true)().unwrap();

        let results_path = dir.path().join("results.json");
        let output =
            similarity_search(index, source, 2, results_path.clone())().unwrap();

        let JobOutput::Search(map) = output else {
            panic!("expected Search output");
        };
        assert_eq!(map.len(), 3);
        // First entry is the first paper in the file, with itself ranked
        // on top and a3 as runner-up.
        let (first, neighbors) = map.get_index(0).unwrap();
        assert_eq!(first.arxiv_id, "a1");
        assert_eq!(neighbors[0].arxiv_id, "a1");
        assert_eq!(neighbors[1].arxiv_id, "a3");

        assert!(results_path.exists());
    }

    #[test]
    fn similarity_search_without_index_fails_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_embeddings(dir.path());
        let index = Arc::new(VectorIndex::new(dir.path().join("index")));

        let err =
            similarity_search(index, source, 2, dir.path().join("results.json"))().unwrap_err();
        assert!(matches!(err, Error::IndexUnavailable(_)));
    }
}
