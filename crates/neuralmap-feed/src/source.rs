use anyhow::{Context, Result};
use neuralmap_core::GraphData;
use std::collections::HashSet;
use std::path::Path;

/// Reads a graph file. Integrity problems are reported, not rejected; the
/// viewer drops what it cannot place.
pub fn load_graph(path: &Path) -> Result<GraphData> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let graph: GraphData =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;

    let report = check(&graph);
    if report.dangling_edges > 0 || report.missing_parents > 0 || report.duplicate_ids > 0 {
        tracing::warn!(
            dangling_edges = report.dangling_edges,
            missing_parents = report.missing_parents,
            duplicate_ids = report.duplicate_ids,
            "graph has integrity issues"
        );
    }
    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        path = %path.display(),
        "graph loaded"
    );
    Ok(graph)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub dangling_edges: usize,
    pub missing_parents: usize,
    pub duplicate_ids: usize,
}

pub fn check(graph: &GraphData) -> IntegrityReport {
    let mut ids = HashSet::with_capacity(graph.nodes.len());
    let mut report = IntegrityReport::default();
    for n in &graph.nodes {
        if !ids.insert(&n.id) {
            report.duplicate_ids += 1;
        }
    }
    report.missing_parents = graph
        .nodes
        .iter()
        .filter(|n| n.parent_id.as_ref().is_some_and(|p| !ids.contains(p)))
        .count();
    report.dangling_edges = graph
        .edges
        .iter()
        .filter(|e| !ids.contains(&e.source) || !ids.contains(&e.target))
        .count();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuralmap_core::{Edge, EdgeKind, Node, NodeType};
    use std::io::Write;

    #[test]
    fn counts_integrity_problems() {
        let graph = GraphData {
            nodes: vec![
                Node::new("a", NodeType::SelfNode, "A"),
                Node::new("a", NodeType::Idea, "dup"),
                Node::new("b", NodeType::Idea, "B").with_parent("ghost"),
            ],
            edges: vec![
                Edge::new("a", "b", EdgeKind::References),
                Edge::new("a", "nowhere", EdgeKind::References),
            ],
        };
        assert_eq!(
            check(&graph),
            IntegrityReport {
                dangling_edges: 1,
                missing_parents: 1,
                duplicate_ids: 1,
            }
        );
    }

    #[test]
    fn loads_and_reports_parse_errors() {
        let mut good = tempfile::NamedTempFile::new().expect("temp file");
        write!(good, r#"{{"nodes":[{{"id":"a","type":"concept"}}]}}"#).expect("write");
        let graph = load_graph(good.path()).expect("graph loaded");
        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.edges.is_empty());

        let mut bad = tempfile::NamedTempFile::new().expect("temp file");
        write!(bad, "not json").expect("write");
        let err = load_graph(bad.path()).expect_err("parse should fail");
        assert!(format!("{err:#}").contains("parse"));
    }
}
