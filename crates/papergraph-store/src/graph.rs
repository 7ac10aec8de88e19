//! Similarity graph derivation from persisted results.

use std::collections::HashSet;

use tracing::info;

use papergraph_core::{Graph, GraphLink, GraphNode, PersistedResult};

/// Build a node/edge graph from the first `max_nodes` persisted results.
///
/// Truncation, not sampling: taking a prefix keeps the export deterministic
/// and bounds response size for visualization clients. Nodes are
/// deduplicated by id (first occurrence wins), self-links are excluded at
/// emission, and links whose target did not make it into the node set are
/// dropped afterwards.
pub fn build_graph(results: &[PersistedResult], max_nodes: usize) -> Graph {
    let taken = &results[..results.len().min(max_nodes)];

    let mut nodes = Vec::new();
    let mut node_ids = HashSet::new();
    let mut links = Vec::new();

    for entry in taken {
        if node_ids.insert(entry.arxiv_id.clone()) {
            nodes.push(GraphNode {
                id: entry.arxiv_id.clone(),
                label: entry.title.clone(),
            });
        }
        for similar in &entry.similars {
            if similar.arxiv_id != entry.arxiv_id {
                links.push(GraphLink {
                    source: entry.arxiv_id.clone(),
                    target: similar.arxiv_id.clone(),
                });
            }
        }
    }

    links.retain(|link| node_ids.contains(&link.target));

    info!(nodes = nodes.len(), links = links.len(), "built similarity graph");
    Graph { nodes, links }
}
