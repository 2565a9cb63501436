use bevy::prelude::Resource;

use crate::render::highlight::Palette;
use crate::render::lod::LodThresholds;
use crate::render::strategy::{
    edge_strategy_for, node_strategy_for, EdgeStrategy, FrameInput, NodeStrategy, RenderPath,
    StyleContext,
};
use crate::render::surface::{DrawSurface, SurfaceState};
use crate::util::config::RenderSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub nodes: usize,
    pub edges: usize,
    pub strategy_switches: u64,
}

/// Picks node and edge strategies for the current visible set and drives
/// them against a [`DrawSurface`] once per frame.
#[derive(Resource)]
pub struct SceneRenderer {
    state: SurfaceState,
    nodes: Box<dyn NodeStrategy>,
    edges: Box<dyn EdgeStrategy>,
    instancing_threshold: usize,
    edge_batching_threshold: usize,
    style: StyleContext,
    seen_visible_generation: Option<u64>,
    pending_resize: Option<(f32, f32)>,
    release_nodes: bool,
    release_edges: bool,
    stats: RenderStats,
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(&RenderSettings::default())
    }
}

impl SceneRenderer {
    pub fn new(cfg: &RenderSettings) -> Self {
        Self {
            state: SurfaceState::Pending,
            nodes: node_strategy_for(0, cfg.instancing_threshold),
            edges: edge_strategy_for(0, cfg.edge_batching_threshold),
            instancing_threshold: cfg.instancing_threshold,
            edge_batching_threshold: cfg.edge_batching_threshold,
            style: StyleContext {
                palette: Palette::from_settings(cfg),
                lod: LodThresholds {
                    near: cfg.lod_near,
                    far: cfg.lod_far,
                },
            },
            seen_visible_generation: None,
            pending_resize: None,
            release_nodes: false,
            release_edges: false,
            stats: RenderStats::default(),
        }
    }

    pub fn state(&self) -> &SurfaceState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SurfaceState::Ready
    }

    pub fn mark_ready(&mut self) {
        if self.state != SurfaceState::Ready {
            tracing::info!("render surface ready");
        }
        self.state = SurfaceState::Ready;
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(%reason, "render surface unavailable");
        self.state = SurfaceState::Failed(reason);
    }

    /// Re-selects strategies when the visible set has been rebuilt. The
    /// strategy being replaced has its geometry released on the next frame.
    pub fn on_visible_set_changed(&mut self, generation: u64, node_count: usize, edge_count: usize) {
        if self.seen_visible_generation == Some(generation) {
            return;
        }
        self.seen_visible_generation = Some(generation);

        let node_path = path_for(node_count, self.instancing_threshold);
        if node_path != self.nodes.path() {
            self.nodes = node_strategy_for(node_count, self.instancing_threshold);
            self.release_nodes = true;
            self.stats.strategy_switches += 1;
            tracing::debug!(count = node_count, path = node_path.label(), "node strategy switched");
        }
        let edge_path = path_for(edge_count, self.edge_batching_threshold);
        if edge_path != self.edges.path() {
            self.edges = edge_strategy_for(edge_count, self.edge_batching_threshold);
            self.release_edges = true;
            self.stats.strategy_switches += 1;
            tracing::debug!(count = edge_count, path = edge_path.label(), "edge strategy switched");
        }
    }

    /// Draws one frame. Does nothing unless the surface is ready.
    pub fn render_frame(&mut self, frame: &FrameInput, surface: &mut dyn DrawSurface) -> bool {
        if !self.is_ready() {
            return false;
        }
        if let Some((w, h)) = self.pending_resize.take() {
            surface.resize(w, h);
        }
        if std::mem::take(&mut self.release_nodes) {
            surface.release_nodes();
        }
        if std::mem::take(&mut self.release_edges) {
            surface.release_edges();
        }
        self.nodes.draw(frame, &self.style, surface);
        self.edges.draw(frame, &self.style, surface);

        self.stats.frames += 1;
        self.stats.nodes = frame.nodes.len();
        self.stats.edges = frame.links.len();
        true
    }

    /// Resizes are coalesced and applied before the next drawn frame.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.pending_resize = Some((width, height));
    }

    /// Drops all geometry and returns to the pending state.
    pub fn dispose(&mut self, surface: &mut dyn DrawSurface) {
        surface.release_nodes();
        surface.release_edges();
        self.state = SurfaceState::Pending;
        self.seen_visible_generation = None;
        self.release_nodes = false;
        self.release_edges = false;
        self.pending_resize = None;
    }

    /// Tries again after a failed mount.
    pub fn remount(&mut self) {
        if matches!(self.state, SurfaceState::Failed(_)) {
            tracing::info!("retrying render surface");
            self.state = SurfaceState::Pending;
            self.seen_visible_generation = None;
        }
    }

    pub fn node_path(&self) -> RenderPath {
        self.nodes.path()
    }

    pub fn edge_path(&self) -> RenderPath {
        self.edges.path()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

fn path_for(count: usize, threshold: usize) -> RenderPath {
    if count >= threshold {
        RenderPath::Throughput
    } else {
        RenderPath::Individual
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SelectionState;
    use crate::render::surface::recording::{Call, RecordingSurface};
    use crate::sim::{SimLink, SimNode};
    use bevy::math::Vec3;
    use neuralmap_core::{EdgeKind, NodeId, NodeType};
    use std::collections::HashSet;

    fn chain(n: usize) -> (Vec<SimNode>, Vec<SimLink>) {
        let nodes: Vec<SimNode> = (0..n)
            .map(|i| SimNode {
                id: NodeId::new(format!("n{i}")),
                node_type: NodeType::Concept,
                importance: 0.0,
                parent_id: None,
                position: Vec3::new(i as f32 * 10.0, 0.0, 0.0),
                velocity: Vec3::ZERO,
                pinned: None,
                radius: 3.0,
            })
            .collect();
        let links = (1..n)
            .map(|i| SimLink {
                id: format!("l{i}"),
                source: i - 1,
                target: i,
                kind: EdgeKind::Supports,
                strength: 1.0,
            })
            .collect();
        (nodes, links)
    }

    fn render(r: &mut SceneRenderer, nodes: &[SimNode], links: &[SimLink]) -> RecordingSurface {
        let sel = SelectionState::default();
        let hl = HashSet::new();
        let frame = FrameInput {
            nodes,
            links,
            selection: &sel,
            highlighted: &hl,
            camera_position: Vec3::new(0.0, 50.0, 200.0),
            center: None,
        };
        let mut surface = RecordingSurface::default();
        r.render_frame(&frame, &mut surface);
        surface
    }

    #[test]
    fn nothing_is_drawn_before_the_surface_is_ready() {
        let mut r = SceneRenderer::default();
        let (nodes, links) = chain(5);
        r.on_visible_set_changed(1, nodes.len(), links.len());
        assert!(render(&mut r, &nodes, &links).calls.is_empty());

        r.mark_ready();
        let s = render(&mut r, &nodes, &links);
        assert!(s.took(|c| *c == Call::NodeMeshes(5)));
        assert!(s.took(|c| *c == Call::EdgeLines(4)));
    }

    #[test]
    fn crossing_the_node_threshold_switches_to_instancing() {
        let mut r = SceneRenderer::default();
        r.mark_ready();

        let (nodes, _) = chain(99);
        r.on_visible_set_changed(1, nodes.len(), 0);
        assert_eq!(r.node_path(), RenderPath::Individual);
        assert!(render(&mut r, &nodes, &[]).took(|c| *c == Call::NodeMeshes(99)));

        let (nodes, _) = chain(100);
        r.on_visible_set_changed(2, nodes.len(), 0);
        assert_eq!(r.node_path(), RenderPath::Throughput);
        let s = render(&mut r, &nodes, &[]);
        assert_eq!(s.calls.first(), Some(&Call::ReleaseNodes));
        assert!(s.took(|c| *c == Call::NodeInstances(100)));
        assert!(!s.took(|c| matches!(c, Call::NodeMeshes(_))));
    }

    #[test]
    fn crossing_the_edge_threshold_switches_to_batching() {
        let mut r = SceneRenderer::default();
        r.mark_ready();

        let (nodes, links) = chain(200);
        r.on_visible_set_changed(1, nodes.len(), links.len());
        assert_eq!(links.len(), 199);
        assert_eq!(r.edge_path(), RenderPath::Individual);

        let (nodes, links) = chain(201);
        r.on_visible_set_changed(2, nodes.len(), links.len());
        assert_eq!(r.edge_path(), RenderPath::Throughput);
        let s = render(&mut r, &nodes, &links);
        assert!(s.took(|c| *c == Call::ReleaseEdges));
        assert!(s.took(|c| *c == Call::EdgeSegments(200)));
    }

    #[test]
    fn same_generation_is_ignored() {
        let mut r = SceneRenderer::default();
        r.on_visible_set_changed(7, 500, 500);
        let switches = r.stats().strategy_switches;
        r.on_visible_set_changed(7, 0, 0);
        assert_eq!(r.stats().strategy_switches, switches);
        assert_eq!(r.node_path(), RenderPath::Throughput);
    }

    #[test]
    fn resize_is_applied_before_the_next_frame() {
        let mut r = SceneRenderer::default();
        r.mark_ready();
        r.resize(0.0, 100.0);
        r.resize(800.0, 600.0);
        r.resize(1024.0, 768.0);
        let (nodes, links) = chain(2);
        let s = render(&mut r, &nodes, &links);
        assert_eq!(s.calls.first(), Some(&Call::Resize(1024.0, 768.0)));
        assert_eq!(s.calls.iter().filter(|c| matches!(c, Call::Resize(..))).count(), 1);
    }

    #[test]
    fn failed_surface_can_be_remounted() {
        let mut r = SceneRenderer::default();
        r.mark_failed("no adapter");
        assert!(matches!(r.state(), SurfaceState::Failed(_)));
        r.remount();
        assert_eq!(r.state(), &SurfaceState::Pending);

        r.mark_ready();
        let mut surface = RecordingSurface::default();
        r.dispose(&mut surface);
        assert_eq!(surface.calls, vec![Call::ReleaseNodes, Call::ReleaseEdges]);
        assert!(!r.is_ready());
    }

    #[test]
    fn dashed_edges_split_into_segments() {
        let mut r = SceneRenderer::default();
        r.mark_ready();
        let (nodes, mut links) = chain(2);
        links[0].kind = EdgeKind::References;
        r.on_visible_set_changed(1, nodes.len(), links.len());
        let s = render(&mut r, &nodes, &links);
        assert!(s.last_lines.len() > 1);
    }
}
