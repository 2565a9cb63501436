use neuralmap_core::{Edge, Node, NodeId, NodeType};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unknown,
    InProgress,
    Visible,
    Hidden,
}

/// The subset of the graph that should be laid out and drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl VisibleGraph {
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    /// Same node ids and edge ids, in the same order.
    pub fn same_membership(&self, other: &VisibleGraph) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.edges.len() == other.edges.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| a.id == b.id)
            && self.edges.iter().zip(&other.edges).all(|(a, b)| a.id == b.id)
    }
}

/// A node is visible when it is a `self` node, has no parent, or its parent is
/// both visible and expanded. Missing parents and parent cycles hide the node.
/// Edges survive only when both endpoints are visible.
pub fn compute_visible(nodes: &[Node], edges: &[Edge], expanded: &HashSet<NodeId>) -> VisibleGraph {
    let mut index: HashMap<&NodeId, usize> = HashMap::with_capacity(nodes.len());
    for (i, n) in nodes.iter().enumerate() {
        index.entry(&n.id).or_insert(i);
    }

    let mut marks = vec![Mark::Unknown; nodes.len()];
    let mut path: SmallVec<[usize; 32]> = SmallVec::new();

    for start in 0..nodes.len() {
        if matches!(marks[start], Mark::Visible | Mark::Hidden) {
            continue;
        }
        path.clear();
        let mut cur = start;
        let top_visible = loop {
            match marks[cur] {
                Mark::Visible => break true,
                Mark::Hidden => break false,
                Mark::InProgress => {
                    tracing::warn!(node = %nodes[cur].id, "parent cycle detected, hiding chain");
                    break false;
                }
                Mark::Unknown => {}
            }

            let node = &nodes[cur];
            if node.node_type == NodeType::SelfNode {
                marks[cur] = Mark::Visible;
                break true;
            }
            let Some(parent_id) = node.parent_id.as_ref() else {
                marks[cur] = Mark::Visible;
                break true;
            };
            let Some(&parent) = index.get(parent_id) else {
                tracing::debug!(node = %node.id, parent = %parent_id, "parent missing, hiding node");
                marks[cur] = Mark::Hidden;
                break false;
            };
            marks[cur] = Mark::InProgress;
            path.push(cur);
            cur = parent;
        };

        // Resolve the walked chain from the top down.
        let mut parent_visible = top_visible;
        for &i in path.iter().rev() {
            let visible = parent_visible
                && nodes[i]
                    .parent_id
                    .as_ref()
                    .is_some_and(|p| expanded.contains(p));
            marks[i] = if visible { Mark::Visible } else { Mark::Hidden };
            parent_visible = visible;
        }
    }

    let is_visible = |id: &NodeId| {
        index
            .get(id)
            .is_some_and(|&i| marks[i] == Mark::Visible)
    };

    let mut out = VisibleGraph::default();
    let mut seen: HashSet<&NodeId> = HashSet::with_capacity(nodes.len());
    for (i, n) in nodes.iter().enumerate() {
        if marks[i] == Mark::Visible && seen.insert(&n.id) {
            out.nodes.push(n.clone());
        }
    }
    let mut dropped = 0usize;
    for e in edges {
        if is_visible(&e.source) && is_visible(&e.target) {
            out.edges.push(e.clone());
        } else if !index.contains_key(&e.source) || !index.contains_key(&e.target) {
            dropped += 1;
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, "edges with missing endpoints skipped");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuralmap_core::EdgeKind;
    use proptest::prelude::*;

    fn ids(v: &VisibleGraph) -> Vec<&str> {
        v.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn set(items: &[&str]) -> HashSet<NodeId> {
        items.iter().map(|s| NodeId::from(*s)).collect()
    }

    fn tree() -> Vec<Node> {
        vec![
            Node::new("self", NodeType::SelfNode, "Me"),
            Node::new("a", NodeType::Project, "A").with_parent("self"),
            Node::new("a1", NodeType::Doc, "A1").with_parent("a"),
            Node::new("a2", NodeType::Doc, "A2").with_parent("a"),
            Node::new("a1x", NodeType::Idea, "A1x").with_parent("a1"),
        ]
    }

    #[test]
    fn expanding_reveals_one_level_at_a_time() {
        let nodes = tree();
        let edges = vec![
            Edge::new("self", "a", EdgeKind::ParentChild),
            Edge::new("a", "a1", EdgeKind::ParentChild),
        ];

        let v = compute_visible(&nodes, &edges, &HashSet::new());
        assert_eq!(ids(&v), vec!["self"]);
        assert!(v.edges.is_empty());

        let v = compute_visible(&nodes, &edges, &set(&["self"]));
        assert_eq!(ids(&v), vec!["self", "a"]);
        assert_eq!(v.edges.len(), 1);

        let v = compute_visible(&nodes, &edges, &set(&["self", "a"]));
        assert_eq!(ids(&v), vec!["self", "a", "a1", "a2"]);
        assert_eq!(v.edges.len(), 2);
    }

    #[test]
    fn collapsed_ancestor_hides_expanded_descendants() {
        let nodes = tree();
        let v = compute_visible(&nodes, &[], &set(&["a", "a1"]));
        assert_eq!(ids(&v), vec!["self"]);
    }

    #[test]
    fn missing_parent_fails_closed() {
        let nodes = vec![
            Node::new("root", NodeType::Concept, "Root"),
            Node::new("orphan", NodeType::Concept, "Orphan").with_parent("ghost"),
        ];
        let v = compute_visible(&nodes, &[], &set(&["ghost"]));
        assert_eq!(ids(&v), vec!["root"]);
    }

    #[test]
    fn cycles_terminate_and_hide_members() {
        let nodes = vec![
            Node::new("x", NodeType::Concept, "X").with_parent("y"),
            Node::new("y", NodeType::Concept, "Y").with_parent("z"),
            Node::new("z", NodeType::Concept, "Z").with_parent("x"),
            Node::new("tail", NodeType::Concept, "T").with_parent("x"),
            Node::new("loop", NodeType::Concept, "L").with_parent("loop"),
            Node::new("free", NodeType::Concept, "F"),
        ];
        let v = compute_visible(&nodes, &[], &set(&["x", "y", "z", "loop"]));
        assert_eq!(ids(&v), vec!["free"]);
    }

    #[test]
    fn self_nodes_are_always_visible() {
        let nodes = vec![
            Node::new("p", NodeType::Folder, "P"),
            Node::new("me", NodeType::SelfNode, "Me").with_parent("p"),
            Node::new("kid", NodeType::Task, "Kid").with_parent("me"),
        ];
        let v = compute_visible(&nodes, &[], &set(&["me"]));
        assert_eq!(ids(&v), vec!["p", "me", "kid"]);
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let nodes = vec![Node::new("a", NodeType::Concept, "A")];
        let edges = vec![Edge::new("a", "nowhere", EdgeKind::References)];
        let v = compute_visible(&nodes, &edges, &HashSet::new());
        assert!(v.edges.is_empty());
    }

    #[test]
    fn membership_comparison_ignores_payload() {
        let nodes = tree();
        let a = compute_visible(&nodes, &[], &set(&["self"]));
        let mut renamed = nodes.clone();
        renamed[1].title = "Renamed".into();
        let b = compute_visible(&renamed, &[], &set(&["self"]));
        assert!(a.same_membership(&b));
        let c = compute_visible(&nodes, &[], &set(&["self", "a"]));
        assert!(!a.same_membership(&c));
    }

    /// Straightforward recursive definition with a depth cap standing in for cycle detection.
    fn reference_visible(
        i: usize,
        parents: &[Option<usize>],
        is_self: &[bool],
        expanded: &[bool],
        depth: usize,
    ) -> bool {
        if depth > parents.len() {
            return false;
        }
        if is_self[i] {
            return true;
        }
        match parents[i] {
            None => true,
            Some(p) if p >= parents.len() => false,
            Some(p) => expanded[p] && reference_visible(p, parents, is_self, expanded, depth + 1),
        }
    }

    proptest! {
        #[test]
        fn matches_recursive_definition(
            shape in prop::collection::vec(
                (prop::option::of(0usize..48), any::<bool>(), prop::bool::weighted(0.1)),
                1..40,
            ),
            edge_pairs in prop::collection::vec((0usize..48, 0usize..48), 0..60),
        ) {
            let n = shape.len();
            let parents: Vec<Option<usize>> = shape.iter().map(|(p, _, _)| *p).collect();
            let expanded_flags: Vec<bool> = shape.iter().map(|(_, e, _)| *e).collect();
            let is_self: Vec<bool> = shape.iter().map(|(_, _, s)| *s).collect();

            let nodes: Vec<Node> = (0..n)
                .map(|i| {
                    let ty = if is_self[i] { NodeType::SelfNode } else { NodeType::Concept };
                    let mut node = Node::new(format!("n{i}"), ty, format!("N{i}"));
                    node.parent_id = parents[i].map(|p| NodeId::new(format!("n{p}")));
                    node
                })
                .collect();
            let edges: Vec<Edge> = edge_pairs
                .iter()
                .map(|(s, t)| Edge::new(format!("n{s}"), format!("n{t}"), EdgeKind::References))
                .collect();
            let expanded: HashSet<NodeId> = (0..n)
                .filter(|&i| expanded_flags[i])
                .map(|i| NodeId::new(format!("n{i}")))
                .collect();

            let v = compute_visible(&nodes, &edges, &expanded);
            let got: HashSet<&str> = v.nodes.iter().map(|n| n.id.as_str()).collect();

            for i in 0..n {
                let want = reference_visible(i, &parents, &is_self, &expanded_flags, 0);
                prop_assert_eq!(got.contains(format!("n{i}").as_str()), want, "node n{}", i);
            }
            for e in &v.edges {
                prop_assert!(got.contains(e.source.as_str()));
                prop_assert!(got.contains(e.target.as_str()));
            }
            let expected_edges = edges
                .iter()
                .filter(|e| got.contains(e.source.as_str()) && got.contains(e.target.as_str()))
                .count();
            prop_assert_eq!(v.edges.len(), expected_edges);
        }
    }
}
