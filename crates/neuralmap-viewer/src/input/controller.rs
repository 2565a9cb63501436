use bevy::math::{Vec2, Vec3};
use bevy::prelude::Resource;
use neuralmap_core::NodeId;

use crate::graph::GraphStore;
use crate::sim::Simulation;
use crate::util::config::InteractionSettings;

/// One pointer observation, already resolved against the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerSample {
    pub screen: Vec2,
    /// Node under the cursor, if any.
    pub hit: Option<NodeId>,
    /// Cursor on the drag plane of the node being dragged.
    pub world: Option<Vec3>,
    /// Ctrl or Shift held.
    pub additive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEffect {
    Clicked(NodeId),
    Hovered(Option<NodeId>),
    FocusRequested(NodeId),
    BackgroundCleared,
    DragStarted(NodeId),
    DragEnded(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Pressed {
        id: Option<NodeId>,
        origin: Vec2,
        additive: bool,
    },
    Dragging {
        id: NodeId,
    },
}

/// Turns pointer samples into selection, hover and drag changes.
#[derive(Resource, Debug, Clone)]
pub struct InteractionController {
    gesture: Gesture,
    last_screen: Option<Vec2>,
    drag_threshold: f32,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(&InteractionSettings::default())
    }
}

impl InteractionController {
    pub fn new(cfg: &InteractionSettings) -> Self {
        Self {
            gesture: Gesture::Idle,
            last_screen: None,
            drag_threshold: cfg.drag_threshold_px.max(0.0),
        }
    }

    pub fn dragged(&self) -> Option<&NodeId> {
        match &self.gesture {
            Gesture::Dragging { id } => Some(id),
            _ => None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn pointer_down(&mut self, sample: &PointerSample, sim: &mut Simulation) {
        if let Some(id) = &sample.hit {
            sim.pin_node(id, true);
        }
        self.gesture = Gesture::Pressed {
            id: sample.hit.clone(),
            origin: sample.screen,
            additive: sample.additive,
        };
    }

    pub fn pointer_move(
        &mut self,
        sample: &PointerSample,
        store: &mut GraphStore,
        sim: &mut Simulation,
    ) -> Vec<InteractionEffect> {
        let mut out = Vec::new();

        if let Gesture::Pressed {
            id: Some(id),
            origin,
            ..
        } = &self.gesture
        {
            if sample.screen.distance(*origin) >= self.drag_threshold {
                let id = id.clone();
                if sim.index_of(&id).is_some() {
                    out.push(InteractionEffect::DragStarted(id.clone()));
                    self.gesture = Gesture::Dragging { id };
                } else {
                    self.gesture = Gesture::Idle;
                }
            }
        }

        if let Gesture::Dragging { id } = &self.gesture {
            if let Some(world) = sample.world {
                if !sim.drag_node(id, world) {
                    tracing::debug!(%id, "drag target vanished");
                    sim.end_drag(id, true);
                    self.gesture = Gesture::Idle;
                }
            }
            self.last_screen = Some(sample.screen);
            return out;
        }

        if self.last_screen != Some(sample.screen) {
            self.last_screen = Some(sample.screen);
            if store.set_hovered(sample.hit.clone()) {
                out.push(InteractionEffect::Hovered(store.selection().hovered.clone()));
            }
        }
        out
    }

    pub fn pointer_up(
        &mut self,
        _sample: &PointerSample,
        store: &mut GraphStore,
        sim: &mut Simulation,
    ) -> Vec<InteractionEffect> {
        let mut out = Vec::new();
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Pressed {
                id: Some(id),
                additive,
                ..
            } => {
                sim.end_drag(&id, true);
                if store.contains(&id) {
                    if additive {
                        store.toggle_selected(&id);
                    } else {
                        store.select_only(&id);
                        out.push(InteractionEffect::FocusRequested(id.clone()));
                    }
                    out.insert(0, InteractionEffect::Clicked(id));
                }
            }
            Gesture::Pressed { id: None, .. } => {
                store.clear_selection();
                out.push(InteractionEffect::BackgroundCleared);
            }
            Gesture::Dragging { id } => {
                sim.end_drag(&id, true);
                out.push(InteractionEffect::DragEnded(id));
            }
        }
        out
    }

    /// Hover-out for a specific node. Ignored unless `id` is the hovered one.
    pub fn pointer_out(&mut self, id: &NodeId, store: &mut GraphStore) -> Vec<InteractionEffect> {
        if store.selection().is_hovered(id) && store.set_hovered(None) {
            return vec![InteractionEffect::Hovered(None)];
        }
        Vec::new()
    }

    /// The pointer left the window.
    pub fn pointer_left(
        &mut self,
        store: &mut GraphStore,
        sim: &mut Simulation,
    ) -> Vec<InteractionEffect> {
        let mut out = Vec::new();
        self.last_screen = None;
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging { id } => {
                sim.end_drag(&id, true);
                out.push(InteractionEffect::DragEnded(id));
            }
            // Pinned on press; no click is reported.
            Gesture::Pressed { id: Some(id), .. } => {
                sim.end_drag(&id, true);
            }
            _ => {}
        }
        if store.set_hovered(None) {
            out.push(InteractionEffect::Hovered(None));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::SimulationSettings;
    use neuralmap_core::{Edge, EdgeKind, GraphData, Node, NodeType};

    fn setup() -> (GraphStore, Simulation, InteractionController) {
        let mut store = GraphStore::default();
        store.replace_graph(GraphData {
            nodes: vec![
                Node::new("me", NodeType::SelfNode, "Me"),
                Node::new("a", NodeType::Project, "A").with_parent("me"),
                Node::new("b", NodeType::Idea, "B").with_parent("me"),
            ],
            edges: vec![
                Edge::new("me", "a", EdgeKind::ParentChild),
                Edge::new("me", "b", EdgeKind::ParentChild),
            ],
        });
        let visible = store.visible();
        let mut sim = Simulation::new(SimulationSettings::default());
        sim.init(&visible.nodes, &visible.edges, store.layout_params());
        (store, sim, InteractionController::default())
    }

    fn sample(x: f32, hit: Option<&str>) -> PointerSample {
        PointerSample {
            screen: Vec2::new(x, 0.0),
            hit: hit.map(NodeId::from),
            world: None,
            additive: false,
        }
    }

    #[test]
    fn click_selects_and_requests_focus() {
        let (mut store, mut sim, mut ctl) = setup();
        let a = NodeId::from("a");
        ctl.pointer_down(&sample(10.0, Some("a")), &mut sim);
        ctl.pointer_move(&sample(12.0, Some("a")), &mut store, &mut sim);
        let fx = ctl.pointer_up(&sample(12.0, Some("a")), &mut store, &mut sim);

        assert_eq!(
            fx,
            vec![
                InteractionEffect::Clicked(a.clone()),
                InteractionEffect::FocusRequested(a.clone())
            ]
        );
        assert_eq!(store.selection().selected, vec![a.clone()]);
        let i = sim.index_of(&a).expect("visible");
        assert!(sim.nodes()[i].pinned.is_none());
    }

    #[test]
    fn moving_past_the_threshold_drags_and_release_unpins() {
        let (mut store, mut sim, mut ctl) = setup();
        let a = NodeId::from("a");
        ctl.pointer_down(&sample(0.0, Some("a")), &mut sim);

        let mut s = sample(10.0, Some("a"));
        s.world = Some(Vec3::new(5.0, 6.0, 7.0));
        let fx = ctl.pointer_move(&s, &mut store, &mut sim);
        assert_eq!(fx, vec![InteractionEffect::DragStarted(a.clone())]);
        assert_eq!(sim.position(&a), Some(Vec3::new(5.0, 6.0, 7.0)));
        sim.tick();
        assert_eq!(sim.position(&a), Some(Vec3::new(5.0, 6.0, 7.0)));

        let fx = ctl.pointer_up(&s, &mut store, &mut sim);
        assert_eq!(fx, vec![InteractionEffect::DragEnded(a.clone())]);
        assert!(store.selection().selected.is_empty());
        assert!(!sim.is_dragging());
        let i = sim.index_of(&a).expect("visible");
        assert!(sim.nodes()[i].pinned.is_none());
    }

    #[test]
    fn background_click_clears_selection() {
        let (mut store, mut sim, mut ctl) = setup();
        store.select_only(&NodeId::from("b"));
        ctl.pointer_down(&sample(0.0, None), &mut sim);
        let fx = ctl.pointer_up(&sample(0.0, None), &mut store, &mut sim);
        assert_eq!(fx, vec![InteractionEffect::BackgroundCleared]);
        assert!(store.selection().selected.is_empty());
    }

    #[test]
    fn modifier_click_toggles_membership() {
        let (mut store, mut sim, mut ctl) = setup();
        store.select_only(&NodeId::from("a"));
        let mut s = sample(0.0, Some("b"));
        s.additive = true;
        ctl.pointer_down(&s, &mut sim);
        ctl.pointer_up(&s, &mut store, &mut sim);
        assert_eq!(
            store.selection().selected,
            vec![NodeId::from("a"), NodeId::from("b")]
        );

        ctl.pointer_down(&s, &mut sim);
        ctl.pointer_up(&s, &mut store, &mut sim);
        assert_eq!(store.selection().selected, vec![NodeId::from("a")]);
    }

    #[test]
    fn hover_ignores_a_stationary_pointer() {
        let (mut store, mut sim, mut ctl) = setup();
        let fx = ctl.pointer_move(&sample(5.0, Some("a")), &mut store, &mut sim);
        assert_eq!(fx, vec![InteractionEffect::Hovered(Some(NodeId::from("a")))]);

        // Same position, nothing under the cursor this frame: keep hover.
        assert!(ctl
            .pointer_move(&sample(5.0, None), &mut store, &mut sim)
            .is_empty());
        assert!(store.selection().is_hovered(&NodeId::from("a")));

        let fx = ctl.pointer_move(&sample(40.0, None), &mut store, &mut sim);
        assert_eq!(fx, vec![InteractionEffect::Hovered(None)]);
    }

    #[test]
    fn pointer_out_only_clears_the_hovered_node() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.pointer_move(&sample(5.0, Some("a")), &mut store, &mut sim);
        assert!(ctl.pointer_out(&NodeId::from("b"), &mut store).is_empty());
        assert!(store.selection().is_hovered(&NodeId::from("a")));
        assert_eq!(
            ctl.pointer_out(&NodeId::from("a"), &mut store),
            vec![InteractionEffect::Hovered(None)]
        );
    }

    #[test]
    fn vanished_drag_target_ends_silently() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.pointer_down(&sample(0.0, Some("a")), &mut sim);
        let mut s = sample(10.0, Some("a"));
        s.world = Some(Vec3::ONE);
        ctl.pointer_move(&s, &mut store, &mut sim);
        assert!(ctl.dragged().is_some());

        let only_me = vec![Node::new("me", NodeType::SelfNode, "Me")];
        sim.reinit(&only_me, &[], store.layout_params());
        s.screen.x = 20.0;
        assert!(ctl.pointer_move(&s, &mut store, &mut sim).is_empty());
        assert!(ctl.dragged().is_none());
        assert!(!sim.is_dragging());
        assert!(ctl.pointer_up(&s, &mut store, &mut sim).is_empty());
    }

    #[test]
    fn leaving_the_window_drops_hover_and_drag() {
        let (mut store, mut sim, mut ctl) = setup();
        ctl.pointer_move(&sample(5.0, Some("b")), &mut store, &mut sim);
        ctl.pointer_down(&sample(5.0, Some("b")), &mut sim);
        let mut s = sample(30.0, Some("b"));
        s.world = Some(Vec3::new(1.0, 2.0, 3.0));
        ctl.pointer_move(&s, &mut store, &mut sim);

        let fx = ctl.pointer_left(&mut store, &mut sim);
        assert_eq!(
            fx,
            vec![
                InteractionEffect::DragEnded(NodeId::from("b")),
                InteractionEffect::Hovered(None)
            ]
        );
    }

    #[test]
    fn leaving_the_window_mid_press_releases_the_pin() {
        let (mut store, mut sim, mut ctl) = setup();
        let a = NodeId::from("a");
        ctl.pointer_down(&sample(0.0, Some("a")), &mut sim);
        let i = sim.index_of(&a).expect("visible");
        assert!(sim.nodes()[i].pinned.is_some());

        let fx = ctl.pointer_left(&mut store, &mut sim);
        assert!(!fx.iter().any(|e| matches!(e, InteractionEffect::Clicked(_))));
        assert!(sim.nodes()[i].pinned.is_none());
        assert!(store.selection().selected.is_empty());
    }
}
