//! End-to-end pipeline: parse, index build job, search job, persisted
//! results, pagination, graph export.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use papergraph_core::{JobId, JobKind, JobOutput, JobStatus};
use papergraph_index::VectorIndex;
use papergraph_jobs::registry::{JobRegistry, RegistryConfig};
use papergraph_jobs::tasks;
use papergraph_store::{build_graph, load_results, paginate, SimilarityMap};

fn write_embeddings(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("paper.txt.json");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, r#"{{"id":"1","title":"A","arxiv-id":"a1","emb":[1.0,0.0]}}"#).unwrap();
    writeln!(file, r#"{{"id":"2","title":"B","arxiv-id":"a2","emb":[0.0,1.0]}}"#).unwrap();
    writeln!(file, r#"{{"id":"3","title":"C","arxiv-id":"a3","emb":[0.9,0.1]}}"#).unwrap();
    path
}

async fn wait_completed(registry: &JobRegistry, id: JobId) -> Arc<JobOutput> {
    for _ in 0..500 {
        match registry.poll(id).await {
            JobStatus::Running => tokio::time::sleep(Duration::from_millis(5)).await,
            JobStatus::Completed(output) => return output,
            other => panic!("job {id} ended as {other:?}"),
        }
    }
    panic!("job {id} did not finish");
}

#[tokio::test]
async fn full_pipeline_produces_paginated_results_and_graph() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_embeddings(dir.path());
    let results_path = dir.path().join("results.json");

    let registry = JobRegistry::new(RegistryConfig::default());
    let index = Arc::new(VectorIndex::new(dir.path().join("index")));

    // Build the index as a background job.
    let build = registry
        .submit(
            JobKind::IndexBuild,
            tasks::index_build(index.clone(), source.clone(), true),
        )
        .await;
    assert!(!matches!(registry.poll(build).await, JobStatus::NotFound));
    let output = wait_completed(&registry, build).await;
    assert_eq!(*output, JobOutput::IndexBuilt { documents: 3 });

    // Search every paper against the built index.
    let search = registry
        .submit(
            JobKind::Search,
            tasks::similarity_search(index, source, 2, results_path.clone()),
        )
        .await;
    let output = wait_completed(&registry, search).await;
    let JobOutput::Search(map) = &*output else {
        panic!("expected Search output");
    };
    assert_eq!(map.len(), 3);

    // The first paper's neighborhood matches the cosine ordering.
    let (first, neighbors) = map.get_index(0).unwrap();
    assert_eq!(first.arxiv_id, "a1");
    let ids: Vec<&str> = neighbors.iter().map(|n| n.arxiv_id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a3"]);

    // Pages reassemble the map in order.
    let mut rebuilt = SimilarityMap::new();
    for start in (0..map.len()).step_by(2) {
        for (paper, similars) in paginate(map, start, 2).unwrap().iter() {
            rebuilt.insert(paper.clone(), similars.clone());
        }
    }
    assert_eq!(&rebuilt, map);

    // Persisted results feed the graph export; maxNodes truncates.
    let persisted = load_results(&results_path).unwrap();
    assert_eq!(persisted.len(), 3);
    let graph = build_graph(&persisted, 2);
    assert_eq!(graph.nodes.len(), 2);
    for link in &graph.links {
        assert_ne!(link.source, link.target);
        assert!(graph.nodes.iter().any(|n| n.id == link.target));
    }

    registry.shutdown().await.unwrap();
}

#[tokio::test]
async fn search_before_build_surfaces_failure_via_poll() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_embeddings(dir.path());

    let registry = JobRegistry::new(RegistryConfig::default());
    let index = Arc::new(VectorIndex::new(dir.path().join("index")));

    let search = registry
        .submit(
            JobKind::Search,
            tasks::similarity_search(index, source, 2, dir.path().join("results.json")),
        )
        .await;

    let mut status = registry.poll(search).await;
    for _ in 0..500 {
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        status = registry.poll(search).await;
    }

    match status {
        JobStatus::Failed(error) => assert!(error.contains("Index unavailable")),
        other => panic!("expected Failed, got {other:?}"),
    }

    registry.shutdown().await.unwrap();
}
