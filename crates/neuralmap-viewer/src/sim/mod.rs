pub mod engine;
mod forces;
mod octree;
pub mod reheat;

use bevy::app::AppExit;
use bevy::prelude::{EventReader, Res, ResMut, Resource, Time};
use std::time::Duration;

use crate::graph::{GraphStore, VisibleGraph};
use crate::util::config::ViewerConfig;

pub use engine::{FrameState, SimLink, SimNode, Simulation};
pub use reheat::ReheatScheduler;

/// Alpha below which the first layout after a data load counts as ready to frame.
const FRAME_READY_ALPHA: f32 = 0.1;

/// Owns the simulation for the lifetime of the view, rebuilding it whenever
/// the visible subset changes and driving the periodic reheat.
#[derive(Resource)]
pub struct LayoutLifecycle {
    pub sim: Simulation,
    reheat: ReheatScheduler,
    visible: VisibleGraph,
    seen_generation: Option<u64>,
    seen_params_generation: u64,
    visible_generation: u64,
    frame: FrameState,
    frame_pending: bool,
    frame_ready: bool,
}

impl LayoutLifecycle {
    pub fn new(cfg: &ViewerConfig) -> Self {
        let sim = Simulation::new(cfg.simulation.clone());
        let frame = sim.frame_state();
        Self {
            sim,
            reheat: ReheatScheduler::new(&cfg.reheat),
            visible: VisibleGraph::default(),
            seen_generation: None,
            seen_params_generation: 0,
            visible_generation: 0,
            frame,
            frame_pending: false,
            frame_ready: false,
        }
    }

    /// Pulls store changes into the simulation. Returns true when the visible
    /// subset was rebuilt.
    pub fn sync(&mut self, store: &GraphStore) -> bool {
        let params = store.layout_params();
        let mut rebuilt = false;

        if self.seen_generation != Some(store.generation()) {
            self.seen_generation = Some(store.generation());
            let next = store.visible();
            let radial_changed = self.sim.params().radial_distance != params.radial_distance;
            if !self.sim.is_initialized() || radial_changed || next != self.visible {
                if self.visible.nodes.is_empty() && !next.nodes.is_empty() {
                    self.frame_pending = true;
                }
                self.sim.reinit(&next.nodes, &next.edges, params);
                self.visible = next;
                self.visible_generation += 1;
                self.reheat.reset();
                rebuilt = true;
                tracing::debug!(
                    nodes = self.visible.nodes.len(),
                    edges = self.visible.edges.len(),
                    "visible set rebuilt"
                );
            }
        }

        if self.seen_params_generation != store.params_generation() {
            self.seen_params_generation = store.params_generation();
            self.sim.set_params(params);
        }
        rebuilt
    }

    /// One frame of layout work.
    pub fn step(&mut self, dt: Duration) -> FrameState {
        if self.sim.is_running() {
            self.reheat.reset();
        } else if self.reheat.advance(dt) && self.sim.is_initialized() && !self.sim.is_dragging() {
            self.sim.nudge(self.reheat.velocity_jitter);
            self.sim.reheat(self.reheat.alpha);
        }

        self.frame = self.sim.tick();
        if self.frame_pending && self.frame.alpha < FRAME_READY_ALPHA {
            self.frame_pending = false;
            self.frame_ready = true;
        }
        self.frame
    }

    pub fn frame(&self) -> FrameState {
        self.frame
    }

    pub fn visible(&self) -> &VisibleGraph {
        &self.visible
    }

    /// Changes whenever the visible node or edge set was rebuilt.
    pub fn visible_generation(&self) -> u64 {
        self.visible_generation
    }

    /// True once after the first layout following a data load has cooled down.
    pub fn take_frame_ready(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }

    pub fn reheat_enabled(&self) -> bool {
        self.reheat.is_active()
    }

    pub fn set_reheat_enabled(&mut self, enabled: bool) {
        self.reheat.set_enabled(enabled);
    }

    /// Stops the reheat timer and drops all simulation state.
    pub fn dispose(&mut self) {
        self.reheat.cancel();
        self.sim.dispose();
        self.visible = VisibleGraph::default();
        self.seen_generation = None;
        self.frame = self.sim.frame_state();
        tracing::debug!("layout disposed");
    }
}

pub fn drive_layout(time: Res<Time>, store: Res<GraphStore>, mut layout: ResMut<LayoutLifecycle>) {
    layout.sync(&store);
    let dt = time.delta().min(Duration::from_millis(100));
    layout.step(dt);
}

pub fn dispose_on_exit(mut exits: EventReader<AppExit>, mut layout: ResMut<LayoutLifecycle>) {
    if exits.read().next().is_some() {
        layout.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::demo::demo_graph;
    use neuralmap_core::NodeId;

    fn quiet_config() -> ViewerConfig {
        let mut cfg = ViewerConfig::default();
        cfg.reheat.enabled = false;
        cfg
    }

    #[test]
    fn expansion_rebuilds_and_keeps_positions() {
        let mut store = GraphStore::default();
        store.replace_graph(demo_graph(3, 3, 2, 11));
        let mut layout = LayoutLifecycle::new(&quiet_config());

        assert!(layout.sync(&store));
        let first = layout.visible().nodes.len();
        for _ in 0..30 {
            layout.step(Duration::from_millis(16));
        }
        let p0 = NodeId::from("project-0");
        let before = layout.sim.position(&p0).expect("project visible");

        store.expand(&p0);
        assert!(layout.sync(&store));
        assert!(layout.visible().nodes.len() > first);
        assert_eq!(layout.sim.position(&p0), Some(before));
        assert_eq!(layout.visible_generation(), 2);
    }

    #[test]
    fn unchanged_membership_does_not_rebuild() {
        let mut store = GraphStore::default();
        store.replace_graph(demo_graph(2, 2, 1, 5));
        let mut layout = LayoutLifecycle::new(&quiet_config());
        layout.sync(&store);

        // Leaf expansion changes the generation but not the visible set.
        store.expand(&NodeId::from("no-such-node"));
        assert!(!layout.sync(&store));
        assert_eq!(layout.visible_generation(), 1);
    }

    #[test]
    fn radial_change_rebuilds_and_sidebar_only_rescales() {
        let mut store = GraphStore::default();
        store.replace_graph(demo_graph(2, 2, 1, 5));
        let mut layout = LayoutLifecycle::new(&quiet_config());
        layout.sync(&store);

        store.set_sidebar_open(!store.sidebar_open());
        assert!(!layout.sync(&store));
        assert_eq!(layout.sim.params(), store.layout_params());

        store.set_radial_distance(220.0);
        assert!(layout.sync(&store));
    }

    #[test]
    fn first_cooldown_is_reported_once() {
        let mut store = GraphStore::default();
        store.replace_graph(demo_graph(2, 2, 1, 5));
        let mut layout = LayoutLifecycle::new(&quiet_config());
        layout.sync(&store);
        let mut seen = 0;
        for _ in 0..400 {
            layout.step(Duration::from_millis(16));
            if layout.take_frame_ready() {
                seen += 1;
            }
        }
        assert_eq!(seen, 1);
        assert!(!layout.frame().running);
    }

    #[test]
    fn reheat_wakes_a_settled_layout() {
        let mut store = GraphStore::default();
        store.replace_graph(demo_graph(2, 2, 1, 5));
        let mut cfg = ViewerConfig::default();
        cfg.reheat.interval_ms = 100;
        let mut layout = LayoutLifecycle::new(&cfg);
        layout.sync(&store);
        for _ in 0..350 {
            layout.step(Duration::from_millis(1));
        }
        assert!(!layout.frame().running);

        let frame = layout.step(Duration::from_millis(150));
        assert!(frame.running);
    }

    #[test]
    fn dispose_cancels_reheat() {
        let mut store = GraphStore::default();
        store.replace_graph(demo_graph(2, 2, 1, 5));
        let mut layout = LayoutLifecycle::new(&ViewerConfig::default());
        layout.sync(&store);
        layout.dispose();
        assert!(!layout.reheat_enabled());
        assert!(!layout.step(Duration::from_secs(10)).running);
        assert!(layout.visible().nodes.is_empty());
    }
}
