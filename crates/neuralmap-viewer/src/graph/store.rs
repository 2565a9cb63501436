use bevy::prelude::Resource;
use neuralmap_core::{Edge, GraphData, Msg, Node, NodeId};
use std::collections::{HashMap, HashSet};

use crate::graph::visibility::{compute_visible, VisibleGraph};
use crate::sim::engine::find_center;
use crate::util::config::LayoutSettings;

pub const RADIAL_DISTANCE_MIN: f32 = 50.0;
pub const RADIAL_DISTANCE_MAX: f32 = 300.0;
const SIDEBAR_SCALE: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub radial_distance: f32,
    pub charge_strength: f32,
    /// Shrinks rest lengths while the sidebar takes screen space.
    pub scale: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            radial_distance: 150.0,
            charge_strength: -100.0,
            scale: 1.0,
        }
    }
}

impl LayoutParams {
    pub fn effective_distance(&self) -> f32 {
        self.radial_distance * self.scale
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Ordered, no duplicates. The first entry is the primary selection.
    pub selected: Vec<NodeId>,
    pub hovered: Option<NodeId>,
}

impl SelectionState {
    pub fn is_selected(&self, id: &NodeId) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn is_hovered(&self, id: &NodeId) -> bool {
        self.hovered.as_ref() == Some(id)
    }

    pub fn primary(&self) -> Option<&NodeId> {
        self.selected.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Offline,
    Connected(String),
    Error(String),
}

/// Authoritative graph state. Mutated only from the main schedule.
#[derive(Resource)]
pub struct GraphStore {
    graph: GraphData,
    index: HashMap<NodeId, usize>,
    expanded: HashSet<NodeId>,
    selection: SelectionState,
    highlighted: HashSet<NodeId>,
    radial_distance: f32,
    charge_strength: f32,
    sidebar_open: bool,
    focus_request: Option<NodeId>,
    generation: u64,
    params_generation: u64,
    pub feed: FeedStatus,
    pub data_loaded: bool,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self {
            graph: GraphData::default(),
            index: HashMap::new(),
            expanded: HashSet::new(),
            selection: SelectionState::default(),
            highlighted: HashSet::new(),
            radial_distance: 150.0,
            charge_strength: -100.0,
            sidebar_open: true,
            focus_request: None,
            generation: 0,
            params_generation: 0,
            feed: FeedStatus::default(),
            data_loaded: false,
        }
    }
}

impl GraphStore {
    pub fn apply_layout_settings(&mut self, cfg: &LayoutSettings) {
        self.radial_distance = cfg
            .radial_distance
            .clamp(RADIAL_DISTANCE_MIN, RADIAL_DISTANCE_MAX);
        self.charge_strength = cfg.charge_strength;
        self.sidebar_open = cfg.sidebar_open;
        self.generation += 1;
    }

    /// Replaces the whole graph. Expansion state is kept; selection, hover and
    /// highlight drop ids that no longer exist.
    pub fn replace_graph(&mut self, data: GraphData) {
        let mut index = HashMap::with_capacity(data.nodes.len());
        let mut nodes = Vec::with_capacity(data.nodes.len());
        let mut duplicates = 0usize;
        for node in data.nodes {
            if index.contains_key(&node.id) {
                duplicates += 1;
                continue;
            }
            index.insert(node.id.clone(), nodes.len());
            nodes.push(node);
        }
        if duplicates > 0 {
            tracing::warn!(duplicates, "duplicate node ids dropped from snapshot");
        }

        self.graph = GraphData {
            nodes,
            edges: data.edges,
        };
        self.index = index;

        let index = &self.index;
        self.selection.selected.retain(|id| index.contains_key(id));
        if let Some(h) = &self.selection.hovered {
            if !index.contains_key(h) {
                self.selection.hovered = None;
            }
        }
        self.highlighted.retain(|id| index.contains_key(id));

        if !self.data_loaded {
            // Open the center so the first level of the map is on screen.
            if let Some(center) = self.center_node_id() {
                self.expanded.insert(center);
            }
        }
        self.data_loaded = true;
        self.generation += 1;
        tracing::info!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            "graph replaced"
        );
    }

    pub fn nodes(&self) -> &[Node] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.graph.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.graph.nodes[i])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn has_children(&self, id: &NodeId) -> bool {
        self.graph
            .nodes
            .iter()
            .any(|n| n.parent_id.as_ref() == Some(id))
    }

    /// Nodes connected to `id` by any edge, with the edge kind.
    pub fn neighbors(&self, id: &NodeId) -> Vec<(&Node, &Edge)> {
        self.graph
            .edges
            .iter()
            .filter_map(|e| {
                let other = if &e.source == id {
                    &e.target
                } else if &e.target == id {
                    &e.source
                } else {
                    return None;
                };
                self.node(other).map(|n| (n, e))
            })
            .collect()
    }

    /// The unique `self` node, else a unique parentless project, else nothing.
    pub fn center_node_id(&self) -> Option<NodeId> {
        find_center(&self.graph.nodes).map(|i| self.graph.nodes[i].id.clone())
    }

    pub fn visible(&self) -> VisibleGraph {
        compute_visible(&self.graph.nodes, &self.graph.edges, &self.expanded)
    }

    // --- expansion ---

    pub fn is_expanded(&self, id: &NodeId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expand(&mut self, id: &NodeId) {
        if self.expanded.insert(id.clone()) {
            self.generation += 1;
        }
    }

    pub fn collapse(&mut self, id: &NodeId) {
        if self.expanded.remove(id) {
            self.generation += 1;
        }
    }

    pub fn toggle_expansion(&mut self, id: &NodeId) {
        if self.expanded.contains(id) {
            self.collapse(id);
        } else {
            self.expand(id);
        }
    }

    pub fn set_expanded(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        let next: HashSet<NodeId> = ids.into_iter().collect();
        if next != self.expanded {
            self.expanded = next;
            self.generation += 1;
        }
    }

    pub fn expand_all(&mut self) {
        let ids: Vec<NodeId> = self.graph.nodes.iter().map(|n| n.id.clone()).collect();
        self.set_expanded(ids);
    }

    pub fn collapse_all(&mut self) {
        self.set_expanded(std::iter::empty());
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    // --- selection / hover / highlight ---

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn select_only(&mut self, id: &NodeId) {
        if !self.contains(id) {
            return;
        }
        self.selection.selected.clear();
        self.selection.selected.push(id.clone());
    }

    /// Multi-select: adds `id` or removes it if already selected.
    pub fn toggle_selected(&mut self, id: &NodeId) {
        if let Some(pos) = self.selection.selected.iter().position(|s| s == id) {
            self.selection.selected.remove(pos);
        } else if self.contains(id) {
            self.selection.selected.push(id.clone());
        }
    }

    pub fn set_selected(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection.selected.clear();
        for id in ids {
            if self.contains(&id) && !self.selection.selected.contains(&id) {
                self.selection.selected.push(id);
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.selected.clear();
    }

    pub fn set_hovered(&mut self, id: Option<NodeId>) -> bool {
        let id = id.filter(|id| self.contains(id));
        if self.selection.hovered == id {
            return false;
        }
        self.selection.hovered = id;
        true
    }

    pub fn highlighted(&self) -> &HashSet<NodeId> {
        &self.highlighted
    }

    pub fn set_highlighted(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.highlighted = ids.into_iter().filter(|id| self.contains(id)).collect();
    }

    pub fn clear_highlighted(&mut self) {
        self.highlighted.clear();
    }

    // --- layout parameters ---

    pub fn radial_distance(&self) -> f32 {
        self.radial_distance
    }

    pub fn set_radial_distance(&mut self, distance: f32) {
        if !distance.is_finite() {
            return;
        }
        let d = distance.clamp(RADIAL_DISTANCE_MIN, RADIAL_DISTANCE_MAX);
        if (d - self.radial_distance).abs() > f32::EPSILON {
            self.radial_distance = d;
            self.generation += 1;
        }
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        if self.sidebar_open != open {
            self.sidebar_open = open;
            self.params_generation += 1;
        }
    }

    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            radial_distance: self.radial_distance,
            charge_strength: self.charge_strength,
            scale: if self.sidebar_open { SIDEBAR_SCALE } else { 1.0 },
        }
    }

    /// Bumped whenever the visible subset or rest lengths may have changed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bumped when forces need rescaling without a rebuild.
    pub fn params_generation(&self) -> u64 {
        self.params_generation
    }

    // --- camera requests ---

    pub fn request_focus(&mut self, id: NodeId) {
        self.focus_request = Some(id);
    }

    pub fn take_focus_request(&mut self) -> Option<NodeId> {
        self.focus_request.take()
    }

    /// Applies a feed message. Returns false for messages the store does not own.
    pub fn apply(&mut self, msg: Msg) -> bool {
        match msg {
            Msg::Snapshot { graph } => self.replace_graph(graph),
            Msg::SetExpanded { ids } => self.set_expanded(ids),
            Msg::ToggleExpanded { id } => self.toggle_expansion(&id),
            Msg::SetHighlighted { ids } => self.set_highlighted(ids),
            Msg::SelectNodes { ids } => self.set_selected(ids),
            Msg::FocusOnNode { id } => self.request_focus(id),
            Msg::SetRadialDistance { distance } => self.set_radial_distance(distance),
            Msg::SetSidebarOpen { open } => self.set_sidebar_open(open),
            Msg::Hello { .. }
            | Msg::NodeClicked { .. }
            | Msg::NodeHovered { .. }
            | Msg::Ping
            | Msg::Pong => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuralmap_core::{EdgeKind, NodeType};

    fn sample() -> GraphData {
        GraphData {
            nodes: vec![
                Node::new("me", NodeType::SelfNode, "Me"),
                Node::new("p", NodeType::Project, "P").with_parent("me"),
                Node::new("d", NodeType::Doc, "D").with_parent("p"),
            ],
            edges: vec![
                Edge::new("me", "p", EdgeKind::ParentChild),
                Edge::new("p", "d", EdgeKind::ParentChild),
            ],
        }
    }

    #[test]
    fn first_snapshot_opens_center() {
        let mut store = GraphStore::default();
        store.replace_graph(sample());
        assert!(store.is_expanded(&NodeId::from("me")));
        assert_eq!(store.visible().nodes.len(), 2);
    }

    #[test]
    fn replacing_graph_prunes_stale_selection() {
        let mut store = GraphStore::default();
        store.replace_graph(sample());
        store.set_selected(vec![NodeId::from("p"), NodeId::from("d")]);
        store.set_hovered(Some(NodeId::from("d")));
        store.set_highlighted(vec![NodeId::from("d")]);

        let mut next = sample();
        next.nodes.pop();
        next.edges.pop();
        store.replace_graph(next);

        assert_eq!(store.selection().selected, vec![NodeId::from("p")]);
        assert_eq!(store.selection().hovered, None);
        assert!(store.highlighted().is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut data = sample();
        data.nodes.push(Node::new("p", NodeType::Idea, "Dup"));
        let mut store = GraphStore::default();
        store.replace_graph(data);
        assert_eq!(store.nodes().len(), 3);
        assert_eq!(store.node(&NodeId::from("p")).map(|n| n.node_type), Some(NodeType::Project));
    }

    #[test]
    fn radial_distance_is_clamped() {
        let mut store = GraphStore::default();
        store.set_radial_distance(10.0);
        assert_eq!(store.radial_distance(), RADIAL_DISTANCE_MIN);
        store.set_radial_distance(1000.0);
        assert_eq!(store.radial_distance(), RADIAL_DISTANCE_MAX);
        let before = store.generation();
        store.set_radial_distance(f32::NAN);
        assert_eq!(store.generation(), before);
    }

    #[test]
    fn sidebar_only_bumps_params_generation() {
        let mut store = GraphStore::default();
        let g = store.generation();
        let pg = store.params_generation();
        store.set_sidebar_open(false);
        assert_eq!(store.generation(), g);
        assert_eq!(store.params_generation(), pg + 1);
        assert_eq!(store.layout_params().scale, 1.0);
        store.set_sidebar_open(true);
        assert!(store.layout_params().scale < 1.0);
    }

    #[test]
    fn toggle_selected_is_ordered_and_unique() {
        let mut store = GraphStore::default();
        store.replace_graph(sample());
        store.toggle_selected(&NodeId::from("d"));
        store.toggle_selected(&NodeId::from("me"));
        store.toggle_selected(&NodeId::from("ghost"));
        assert_eq!(store.selection().primary(), Some(&NodeId::from("d")));
        store.toggle_selected(&NodeId::from("d"));
        assert_eq!(store.selection().selected, vec![NodeId::from("me")]);
    }

    #[test]
    fn center_prefers_unique_self() {
        let mut store = GraphStore::default();
        store.replace_graph(sample());
        assert_eq!(store.center_node_id(), Some(NodeId::from("me")));

        let mut two = sample();
        two.nodes.push(Node::new("me2", NodeType::SelfNode, "Me too"));
        store.replace_graph(two);
        assert_eq!(store.center_node_id(), None);

        store.replace_graph(GraphData {
            nodes: vec![Node::new("root", NodeType::Project, "Root")],
            edges: vec![],
        });
        assert_eq!(store.center_node_id(), Some(NodeId::from("root")));
    }

    #[test]
    fn feed_messages_route_to_store() {
        let mut store = GraphStore::default();
        assert!(store.apply(Msg::Snapshot { graph: sample() }));
        assert!(store.apply(Msg::ToggleExpanded { id: NodeId::from("p") }));
        assert_eq!(store.visible().nodes.len(), 3);
        assert!(store.apply(Msg::FocusOnNode { id: NodeId::from("d") }));
        assert_eq!(store.take_focus_request(), Some(NodeId::from("d")));
        assert!(!store.apply(Msg::Ping));
    }
}
