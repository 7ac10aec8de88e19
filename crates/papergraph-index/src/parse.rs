//! Newline-delimited embedding file parser.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use papergraph_core::{Error, Paper, Result};

/// Raw wire form of one input line.
///
/// `emb` stays optional here so a vector-less line is reported as a missing
/// embedding rather than a deserialization failure.
#[derive(Deserialize)]
struct RawRecord {
    id: String,
    title: String,
    #[serde(rename = "arxiv-id")]
    arxiv_id: String,
    #[serde(rename = "emb", default)]
    emb: Option<Vec<f32>>,
}

/// Parse a newline-delimited JSON embedding file into paper records.
///
/// One record per non-empty line, in file order. Each line is parsed
/// independently, but any malformed line fails the whole call with the
/// offending 1-based line number: silently skipping lines would change
/// result sets undetectably. Input records must carry a non-empty
/// embedding.
pub fn parse_embeddings(path: impl AsRef<Path>) -> Result<Vec<Paper>> {
    let path = path.as_ref();
    info!(path = %path.display(), "parsing embeddings");

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut papers = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let raw: RawRecord =
            serde_json::from_str(&line).map_err(|e| Error::MalformedRecord {
                line: idx + 1,
                reason: e.to_string(),
            })?;

        let embedding = match raw.emb {
            Some(emb) if !emb.is_empty() => emb,
            _ => return Err(Error::MissingEmbedding(raw.id)),
        };

        papers.push(Paper {
            id: raw.id,
            title: raw.title,
            arxiv_id: raw.arxiv_id,
            embedding,
        });
    }

    debug!(records = papers.len(), "parsed embedding file");
    Ok(papers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lines(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papers.json");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        (dir, path)
    }

    #[test]
    fn parses_one_record_per_line_in_order() {
        let (_dir, path) = write_lines(&[
            r#"{"id":"1","title":"A","arxiv-id":"a1","emb":[1.0,0.0]}"#,
            r#"{"id":"2","title":"B","arxiv-id":"a2","emb":[0.0,1.0]}"#,
            r#"{"id":"3","title":"C","arxiv-id":"a3","emb":[0.9,0.1]}"#,
        ]);

        let papers = parse_embeddings(&path).unwrap();
        assert_eq!(papers.len(), 3);
        assert_eq!(papers[0].arxiv_id, "a1");
        assert_eq!(papers[1].arxiv_id, "a2");
        assert_eq!(papers[2].arxiv_id, "a3");
        assert_eq!(papers[2].embedding, vec![0.9, 0.1]);
    }

    #[test]
    fn skips_blank_lines() {
        let (_dir, path) = write_lines(&[
            r#"{"id":"1","title":"A","arxiv-id":"a1","emb":[1.0]}"#,
            "",
            "   ",
            r#"{"id":"2","title":"B","arxiv-id":"a2","emb":[0.5]}"#,
        ]);

        let papers = parse_embeddings(&path).unwrap();
        assert_eq!(papers.len(), 2);
    }

    #[test]
    fn malformed_line_fails_with_position() {
        let (_dir, path) = write_lines(&[
            r#"{"id":"1","title":"A","arxiv-id":"a1","emb":[1.0]}"#,
            r#"{"id":"2","title":"B",oops"#,
        ]);

        let err = parse_embeddings(&path).unwrap_err();
        match err {
            Error::MalformedRecord { line, .. } => assert_eq!(line, 2),
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn absent_embedding_fails_with_record_id() {
        let (_dir, path) = write_lines(&[r#"{"id":"7","title":"A","arxiv-id":"a1"}"#]);

        let err = parse_embeddings(&path).unwrap_err();
        match err {
            Error::MissingEmbedding(id) => assert_eq!(id, "7"),
            other => panic!("expected MissingEmbedding, got {other:?}"),
        }
    }

    #[test]
    fn empty_embedding_fails_with_record_id() {
        let (_dir, path) = write_lines(&[r#"{"id":"8","title":"A","arxiv-id":"a1","emb":[]}"#]);

        let err = parse_embeddings(&path).unwrap_err();
        assert!(matches!(err, Error::MissingEmbedding(id) if id == "8"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_embeddings(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
