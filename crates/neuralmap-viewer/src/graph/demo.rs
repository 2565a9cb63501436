use neuralmap_core::{Edge, EdgeKind, GraphData, Node, NodeType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CHILD_TYPES: [NodeType; 8] = [
    NodeType::Concept,
    NodeType::Doc,
    NodeType::Idea,
    NodeType::Decision,
    NodeType::Memory,
    NodeType::Task,
    NodeType::Person,
    NodeType::Insight,
];

const CROSS_KINDS: [EdgeKind; 6] = [
    EdgeKind::References,
    EdgeKind::Supports,
    EdgeKind::Contradicts,
    EdgeKind::Causes,
    EdgeKind::SameTopic,
    EdgeKind::Sequence,
];

/// Synthetic map: one self node, `projects` projects, and a few levels of
/// children under each, plus random cross links. Same seed, same graph.
pub fn demo_graph(projects: usize, fanout: usize, depth: usize, seed: u64) -> GraphData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut nodes = vec![Node::new("self", NodeType::SelfNode, "Me").with_importance(10.0)];
    let mut edges = Vec::new();

    let mut frontier: Vec<String> = Vec::new();
    for p in 0..projects {
        let id = format!("project-{p}");
        nodes.push(
            Node::new(id.clone(), NodeType::Project, format!("Project {p}"))
                .with_parent("self")
                .with_importance(rng.gen_range(5.0..10.0)),
        );
        edges.push(Edge::new("self", id.clone(), EdgeKind::ParentChild));
        frontier.push(id);
    }

    for level in 0..depth {
        let mut next = Vec::new();
        for parent in &frontier {
            let kids = rng.gen_range(1..=fanout.max(1));
            for k in 0..kids {
                let id = format!("{parent}/{level}-{k}");
                let ty = CHILD_TYPES[rng.gen_range(0..CHILD_TYPES.len())];
                nodes.push(
                    Node::new(id.clone(), ty, format!("{} {k}", ty.as_str()))
                        .with_parent(parent.clone())
                        .with_importance(rng.gen_range(0.0..8.0)),
                );
                edges.push(Edge::new(parent.clone(), id.clone(), EdgeKind::ParentChild));
                next.push(id);
            }
        }
        frontier = next;
    }

    let cross = nodes.len() / 4;
    for _ in 0..cross {
        let a = rng.gen_range(1..nodes.len());
        let b = rng.gen_range(1..nodes.len());
        if a == b {
            continue;
        }
        let kind = CROSS_KINDS[rng.gen_range(0..CROSS_KINDS.len())];
        edges.push(
            Edge::new(nodes[a].id.as_str(), nodes[b].id.as_str(), kind)
                .with_strength(rng.gen_range(0.2..1.0)),
        );
    }

    GraphData { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_graph_is_deterministic() {
        assert_eq!(demo_graph(3, 3, 2, 7), demo_graph(3, 3, 2, 7));
    }

    #[test]
    fn every_child_has_an_existing_parent() {
        let g = demo_graph(4, 4, 3, 1);
        for n in &g.nodes {
            if let Some(p) = &n.parent_id {
                assert!(g.nodes.iter().any(|m| &m.id == p), "parent {p} missing");
            }
        }
        assert_eq!(g.nodes.iter().filter(|n| n.node_type == NodeType::SelfNode).count(), 1);
    }
}
