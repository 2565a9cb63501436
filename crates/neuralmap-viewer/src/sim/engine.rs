use bevy::math::Vec3;
use neuralmap_core::{Edge, EdgeKind, Node, NodeId, NodeType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::forces::{self, LinkTerm};
use crate::graph::model::{edge_style, node_radius};
use crate::graph::LayoutParams;
use crate::util::config::SimulationSettings;

const DRAG_ALPHA_TARGET: f32 = 0.1;
const PARAMS_REHEAT_ALPHA: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct SimNode {
    pub id: NodeId,
    pub node_type: NodeType,
    pub importance: f32,
    pub parent_id: Option<NodeId>,
    pub position: Vec3,
    pub velocity: Vec3,
    pub pinned: Option<Vec3>,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct SimLink {
    pub id: String,
    pub source: usize,
    pub target: usize,
    pub kind: EdgeKind,
    pub strength: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub alpha: f32,
    pub running: bool,
    pub ticks: u64,
}

/// Kinematic state kept across a rebuild.
#[derive(Debug, Clone, Copy)]
pub struct Carry {
    pub position: Vec3,
    pub velocity: Vec3,
    pub pinned: Option<Vec3>,
}

#[derive(Default)]
struct Scratch {
    pos: Vec<Vec3>,
    vel: Vec<Vec3>,
    dv: Vec<Vec3>,
    pinned: Vec<bool>,
}

/// The unique `self` node, or else the unique parentless project.
pub fn find_center(nodes: &[Node]) -> Option<usize> {
    let unique = |mut it: std::vec::IntoIter<usize>| {
        let first = it.next()?;
        it.next().is_none().then_some(first)
    };
    let selves: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.node_type == NodeType::SelfNode)
        .map(|(i, _)| i)
        .collect();
    if !selves.is_empty() {
        return unique(selves.into_iter());
    }
    let roots: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.node_type == NodeType::Project && n.parent_id.is_none())
        .map(|(i, _)| i)
        .collect();
    unique(roots.into_iter())
}

/// Force-directed layout over the visible subset.
///
/// Nodes live in an arena; links refer to them by index. Every tick first
/// copies positions and velocities into a snapshot, runs all forces against
/// that snapshot into a separate accumulator, and only then integrates.
pub struct Simulation {
    cfg: SimulationSettings,
    params: LayoutParams,
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    index: HashMap<NodeId, usize>,
    center: Option<usize>,
    link_terms: Vec<LinkTerm>,
    charges: Vec<f32>,
    radial_targets: Vec<Option<f32>>,
    alpha: f32,
    alpha_target: f32,
    ticks: u64,
    dragging: Option<usize>,
    rng: StdRng,
    scratch: Scratch,
    initialized: bool,
}

impl Simulation {
    pub fn new(cfg: SimulationSettings) -> Self {
        let rng = StdRng::seed_from_u64(cfg.seed);
        Self {
            cfg,
            params: LayoutParams::default(),
            nodes: Vec::new(),
            links: Vec::new(),
            index: HashMap::new(),
            center: None,
            link_terms: Vec::new(),
            charges: Vec::new(),
            radial_targets: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            ticks: 0,
            dragging: None,
            rng,
            scratch: Scratch::default(),
            initialized: false,
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.cfg
    }

    pub fn set_settings(&mut self, cfg: SimulationSettings) {
        self.cfg = cfg;
        self.rebuild_terms();
    }

    pub fn init(&mut self, nodes: &[Node], edges: &[Edge], params: LayoutParams) {
        self.init_with_carry(nodes, edges, params, &HashMap::new());
    }

    /// Rebuilds for a new visible set. Nodes present before and after keep
    /// their position, velocity and pin.
    pub fn reinit(&mut self, nodes: &[Node], edges: &[Edge], params: LayoutParams) {
        let carry = self.kinematics();
        self.dispose();
        self.init_with_carry(nodes, edges, params, &carry);
    }

    pub fn kinematics(&self) -> HashMap<NodeId, Carry> {
        self.nodes
            .iter()
            .map(|n| {
                (
                    n.id.clone(),
                    Carry {
                        position: n.position,
                        velocity: n.velocity,
                        pinned: n.pinned,
                    },
                )
            })
            .collect()
    }

    pub fn init_with_carry(
        &mut self,
        nodes: &[Node],
        edges: &[Edge],
        params: LayoutParams,
        carry: &HashMap<NodeId, Carry>,
    ) {
        self.params = params;
        self.nodes.clear();
        self.links.clear();
        self.index.clear();
        self.dragging = None;

        for n in nodes {
            if self.index.contains_key(&n.id) {
                continue;
            }
            self.index.insert(n.id.clone(), self.nodes.len());
            self.nodes.push(SimNode {
                id: n.id.clone(),
                node_type: n.node_type,
                importance: n.importance_clamped(),
                parent_id: n.parent_id.clone(),
                position: Vec3::ZERO,
                velocity: Vec3::ZERO,
                pinned: None,
                radius: node_radius(n.node_type, n.importance_clamped()),
            });
        }

        let mut skipped = 0usize;
        for e in edges {
            let (Some(&source), Some(&target)) = (self.index.get(&e.source), self.index.get(&e.target))
            else {
                skipped += 1;
                continue;
            };
            if source == target {
                skipped += 1;
                continue;
            }
            self.links.push(SimLink {
                id: e.id.clone(),
                source,
                target,
                kind: e.kind,
                strength: e.strength_clamped(),
            });
        }
        if skipped > 0 {
            tracing::debug!(skipped, "links without two distinct endpoints ignored");
        }

        self.center = find_center(nodes).and_then(|i| self.index.get(&nodes[i].id).copied());
        self.place_nodes(carry);
        self.rebuild_terms();

        self.alpha = 1.0;
        self.alpha_target = 0.0;
        self.ticks = 0;
        self.initialized = true;
        tracing::debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            carried = carry.len(),
            "simulation initialised"
        );
    }

    fn place_nodes(&mut self, carry: &HashMap<NodeId, Carry>) {
        let spread = self.params.effective_distance() * 0.3;
        let mut placed = vec![false; self.nodes.len()];

        for (i, node) in self.nodes.iter_mut().enumerate() {
            if let Some(c) = carry.get(&node.id) {
                node.position = c.position;
                node.velocity = c.velocity;
                node.pinned = c.pinned;
                placed[i] = true;
            }
        }
        if let Some(c) = self.center {
            if !placed[c] {
                self.nodes[c].position = Vec3::ZERO;
                placed[c] = true;
            }
            self.nodes[c].pinned = Some(Vec3::ZERO);
            self.nodes[c].position = Vec3::ZERO;
            self.nodes[c].velocity = Vec3::ZERO;
        }

        // Children next to their parents, one generation per pass.
        loop {
            let mut progress = false;
            for i in 0..self.nodes.len() {
                if placed[i] {
                    continue;
                }
                let Some(parent) = self.nodes[i].parent_id.as_ref() else {
                    continue;
                };
                let anchor = match self.index.get(parent) {
                    Some(&p) if placed[p] => Some(self.nodes[p].position),
                    Some(_) => None,
                    None => carry.get(parent).map(|c| c.position),
                };
                if let Some(anchor) = anchor {
                    let offset = random_unit(&mut self.rng) * spread * self.rng.gen_range(0.5..1.0);
                    self.nodes[i].position = anchor + offset;
                    placed[i] = true;
                    progress = true;
                }
            }
            if !progress {
                break;
            }
        }

        let remaining: Vec<usize> = (0..self.nodes.len()).filter(|&i| !placed[i]).collect();
        let count = remaining.len();
        let shell = self.params.effective_distance();
        for (k, i) in remaining.into_iter().enumerate() {
            let jitter = random_unit(&mut self.rng) * 0.5;
            self.nodes[i].position = fibonacci_point(k, count) * shell + jitter;
        }
    }

    /// Recomputes link rest lengths, charges and radial shells from the
    /// current params without touching positions.
    fn rebuild_terms(&mut self) {
        let distance = self.params.effective_distance();
        let mut degree = vec![0u32; self.nodes.len()];
        for l in &self.links {
            degree[l.source] += 1;
            degree[l.target] += 1;
        }

        let mut linked_to_center = vec![false; self.nodes.len()];
        if let Some(c) = self.center {
            for l in &self.links {
                if l.source == c {
                    linked_to_center[l.target] = true;
                } else if l.target == c {
                    linked_to_center[l.source] = true;
                }
            }
        }

        self.radial_targets = (0..self.nodes.len())
            .map(|i| match self.center {
                Some(c) if c == i => None,
                Some(_) if self.cfg.radial_enabled => Some(if linked_to_center[i] {
                    distance
                } else {
                    distance * 2.0
                }),
                _ => None,
            })
            .collect();

        let link_strength = self.cfg.link_strength;
        self.link_terms = self
            .links
            .iter()
            .map(|l| {
                let rest = distance * edge_style(l.kind).rest_factor;
                let ds = degree[l.source] as f32;
                let dt = degree[l.target] as f32;
                LinkTerm {
                    source: l.source,
                    target: l.target,
                    rest,
                    strength: link_strength * l.strength,
                    bias: ds / (ds + dt),
                }
            })
            .collect();

        self.charges = self
            .nodes
            .iter()
            .map(|n| self.params.charge_strength * (1.0 + n.importance / 100.0))
            .collect();
    }

    pub fn set_params(&mut self, params: LayoutParams) {
        if self.params == params {
            return;
        }
        self.params = params;
        if self.initialized {
            self.rebuild_terms();
            self.reheat(PARAMS_REHEAT_ALPHA);
        }
    }

    pub fn params(&self) -> LayoutParams {
        self.params
    }

    pub fn tick(&mut self) -> FrameState {
        if !self.initialized || self.nodes.is_empty() {
            return self.frame_state();
        }
        if self.alpha < self.cfg.alpha_min && self.alpha_target < self.cfg.alpha_min {
            return self.frame_state();
        }

        self.alpha += (self.alpha_target - self.alpha) * self.cfg.alpha_decay;
        let alpha = self.alpha;

        let s = &mut self.scratch;
        s.pos.clear();
        s.vel.clear();
        s.pinned.clear();
        s.pos.extend(self.nodes.iter().map(|n| n.position));
        s.vel.extend(self.nodes.iter().map(|n| n.velocity));
        s.pinned.extend(self.nodes.iter().map(|n| n.pinned.is_some()));
        s.dv.clear();
        s.dv.resize(self.nodes.len(), Vec3::ZERO);

        forces::apply_links(&self.link_terms, &s.pos, &s.vel, alpha, &mut self.rng, &mut s.dv);

        if self.nodes.len() >= self.cfg.barnes_hut_threshold {
            forces::apply_charge_barnes_hut(
                &s.pos,
                &self.charges,
                alpha,
                self.cfg.theta,
                self.cfg.charge_distance_max,
                &mut self.rng,
                &mut s.dv,
            );
        } else {
            forces::apply_charge_exact(
                &s.pos,
                &self.charges,
                alpha,
                self.cfg.charge_distance_max,
                &mut self.rng,
                &mut s.dv,
            );
        }

        let radial_active = self.center.is_some() && self.cfg.radial_enabled;
        if radial_active {
            forces::apply_radial(
                &s.pos,
                &self.radial_targets,
                Vec3::ZERO,
                self.cfg.radial_strength,
                alpha,
                &mut self.rng,
                &mut s.dv,
            );
        }

        if self.nodes.len() > self.cfg.collide_threshold {
            let radii: Vec<f32> = self
                .nodes
                .iter()
                .map(|n| 2.0 + n.importance / 50.0 + n.radius)
                .collect();
            forces::apply_collision(
                &s.pos,
                &s.vel,
                &radii,
                self.cfg.collide_strength,
                &mut self.rng,
                &mut s.dv,
            );
        }

        let shift = if radial_active {
            Vec3::ZERO
        } else {
            forces::centering_offset(&s.pos, &s.pinned, self.cfg.center_strength)
        };

        let keep = 1.0 - self.cfg.velocity_decay;
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if let Some(pin) = node.pinned {
                node.position = pin;
                node.velocity = Vec3::ZERO;
                continue;
            }
            node.velocity = (s.vel[i] + s.dv[i]) * keep;
            node.position = s.pos[i] + node.velocity + shift;
        }

        self.ticks += 1;
        self.frame_state()
    }

    pub fn frame_state(&self) -> FrameState {
        FrameState {
            alpha: self.alpha,
            running: self.is_running(),
            ticks: self.ticks,
        }
    }

    pub fn is_running(&self) -> bool {
        self.initialized
            && !self.nodes.is_empty()
            && (self.alpha >= self.cfg.alpha_min || self.alpha_target >= self.cfg.alpha_min)
    }

    pub fn reheat(&mut self, alpha: f32) {
        if self.initialized {
            self.alpha = self.alpha.max(alpha.clamp(0.0, 1.0));
        }
    }

    /// Random velocity kick on every free node.
    pub fn nudge(&mut self, jitter: f32) {
        for node in self.nodes.iter_mut().filter(|n| n.pinned.is_none()) {
            node.velocity += Vec3::new(
                self.rng.gen::<f32>() - 0.5,
                self.rng.gen::<f32>() - 0.5,
                self.rng.gen::<f32>() - 0.5,
            ) * jitter;
        }
    }

    /// Fixes or releases a node at its current position. The center node
    /// always returns to the origin when released.
    pub fn pin_node(&mut self, id: &NodeId, pinned: bool) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        if pinned {
            node.pinned = Some(node.position);
            node.velocity = Vec3::ZERO;
        } else if self.center == Some(i) {
            node.pinned = Some(Vec3::ZERO);
        } else {
            node.pinned = None;
        }
        true
    }

    /// Moves a node to `to` and holds it there. Keeps the layout warm while
    /// the drag lasts.
    pub fn drag_node(&mut self, id: &NodeId, to: Vec3) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        if !to.is_finite() {
            return false;
        }
        let node = &mut self.nodes[i];
        node.pinned = Some(to);
        node.position = to;
        node.velocity = Vec3::ZERO;
        self.dragging = Some(i);
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.reheat(DRAG_ALPHA_TARGET);
        true
    }

    /// Finishes a drag. With `release` the node goes back under simulation
    /// control; otherwise it stays pinned where it was dropped.
    pub fn end_drag(&mut self, id: &NodeId, release: bool) -> bool {
        self.alpha_target = 0.0;
        self.dragging = None;
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        if release {
            self.nodes[i].pinned = if self.center == Some(i) {
                Some(Vec3::ZERO)
            } else {
                None
            };
        }
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    pub fn dispose(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.index.clear();
        self.link_terms.clear();
        self.charges.clear();
        self.radial_targets.clear();
        self.center = None;
        self.dragging = None;
        self.alpha = 0.0;
        self.alpha_target = 0.0;
        self.initialized = false;
        self.scratch = Scratch::default();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn position(&self, id: &NodeId) -> Option<Vec3> {
        self.index_of(id).map(|i| self.nodes[i].position)
    }

    pub fn center_index(&self) -> Option<usize> {
        self.center
    }

    pub fn centroid(&self) -> Option<Vec3> {
        if self.nodes.is_empty() {
            return None;
        }
        let sum: Vec3 = self.nodes.iter().map(|n| n.position).sum();
        Some(sum / self.nodes.len() as f32)
    }
}

fn random_unit(rng: &mut StdRng) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let l = v.length_squared();
        if l > 1e-4 && l <= 1.0 {
            return v / l.sqrt();
        }
    }
}

fn fibonacci_point(k: usize, count: usize) -> Vec3 {
    let n = count.max(1) as f32;
    let i = k as f32 + 0.5;
    let y = 1.0 - 2.0 * i / n;
    let r = (1.0 - y * y).max(0.0).sqrt();
    let phi = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt()) * i;
    Vec3::new(r * phi.cos(), y, r * phi.sin())
}
