//! Durable similarity-result storage and pagination.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use papergraph_core::{write_atomic, Error, PersistedResult, Result, SimilarityMap};

/// Persist the full similarity map to `path` as an ordered JSON array.
///
/// Fully overwrites any prior content (last write wins, no merge). The
/// replacement is atomic, so a crash mid-write never leaves a truncated
/// result file behind.
pub fn save_results(map: &SimilarityMap, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let persisted = map.to_persisted();
    write_atomic(path, &serde_json::to_vec(&persisted)?)?;

    info!(path = %path.display(), results = persisted.len(), "saved similarity results");
    Ok(())
}

/// Load previously persisted similarity results.
pub fn load_results(path: impl AsRef<Path>) -> Result<Vec<PersistedResult>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| {
        Error::ResultsUnavailable(format!("no results at {}: {e}", path.display()))
    })?;
    let results: Vec<PersistedResult> = serde_json::from_slice(&bytes).map_err(|e| {
        Error::ResultsUnavailable(format!("corrupt results at {}: {e}", path.display()))
    })?;

    debug!(results = results.len(), "loaded similarity results");
    Ok(results)
}

/// Slice `[start, start + page_size)` of the map in insertion order.
///
/// A start index at or past the end is an error rather than an empty page:
/// clamping would hide caller bugs. A short tail page (fewer than
/// `page_size` entries remaining) is returned without error.
pub fn paginate(map: &SimilarityMap, start: usize, page_size: usize) -> Result<SimilarityMap> {
    if page_size == 0 {
        return Err(Error::InvalidInput("page size must be at least 1".to_string()));
    }
    if start >= map.len() {
        return Err(Error::OutOfRange {
            start,
            len: map.len(),
        });
    }

    let end = (start + page_size).min(map.len());
    Ok((start..end)
        .filter_map(|i| map.get_index(i))
        .map(|(paper, neighbors)| (paper.clone(), neighbors.clone()))
        .collect())
}

/// One retrieved page plus the retrieval cursor fields callers serve
/// alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage {
    pub total_pages: usize,
    pub next_page: usize,
    pub entries: SimilarityMap,
}

/// Retrieve page `page_number` of the map.
///
/// `total_pages` is the whole-page count (`len / page_size`) and
/// `next_page` is simply `page_number + 1`, matching what result-retrieval
/// callers expect to echo back.
pub fn page(map: &SimilarityMap, page_number: usize, page_size: usize) -> Result<ResultPage> {
    let entries = paginate(map, page_number.saturating_mul(page_size), page_size)?;
    Ok(ResultPage {
        total_pages: map.len() / page_size.max(1),
        next_page: page_number + 1,
        entries,
    })
}
