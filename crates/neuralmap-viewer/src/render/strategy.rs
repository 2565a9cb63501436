use bevy::math::Vec3;
use neuralmap_core::NodeId;
use std::collections::HashSet;

use crate::graph::model::edge_style;
use crate::graph::SelectionState;
use crate::render::highlight::{edge_look, node_look, Palette};
use crate::render::lod::{LodLevel, LodThresholds};
use crate::render::surface::{DrawSurface, InstanceBatch, LineDraw, NodeDraw, SegmentBatch};
use crate::sim::{SimLink, SimNode};

/// World-space length of one unit of a dash pattern.
const DASH_UNIT: f32 = 8.0;
const MAX_DASHES_PER_EDGE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    /// Per-node meshes with LOD, rings and glow / per-edge styled lines.
    Individual,
    /// One shared geometry for all nodes / one vertex-colored line list.
    Throughput,
}

impl RenderPath {
    pub fn label(self) -> &'static str {
        match self {
            RenderPath::Individual => "individual",
            RenderPath::Throughput => "batched",
        }
    }
}

/// Per-frame inputs shared by all strategies.
pub struct FrameInput<'a> {
    pub nodes: &'a [SimNode],
    pub links: &'a [SimLink],
    pub selection: &'a SelectionState,
    pub highlighted: &'a HashSet<NodeId>,
    pub camera_position: Vec3,
    pub center: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StyleContext {
    pub palette: Palette,
    pub lod: LodThresholds,
}

pub trait NodeStrategy: Send + Sync {
    fn path(&self) -> RenderPath;
    fn draw(&mut self, frame: &FrameInput, style: &StyleContext, surface: &mut dyn DrawSurface);
}

pub trait EdgeStrategy: Send + Sync {
    fn path(&self) -> RenderPath;
    fn draw(&mut self, frame: &FrameInput, style: &StyleContext, surface: &mut dyn DrawSurface);
}

pub fn node_strategy_for(count: usize, instancing_threshold: usize) -> Box<dyn NodeStrategy> {
    if count >= instancing_threshold {
        Box::<InstancedNodes>::default()
    } else {
        Box::<IndividualNodes>::default()
    }
}

pub fn edge_strategy_for(count: usize, batching_threshold: usize) -> Box<dyn EdgeStrategy> {
    if count >= batching_threshold {
        Box::<BatchedEdges>::default()
    } else {
        Box::<IndividualEdges>::default()
    }
}

#[derive(Default)]
pub struct IndividualNodes {
    buf: Vec<NodeDraw>,
}

impl NodeStrategy for IndividualNodes {
    fn path(&self) -> RenderPath {
        RenderPath::Individual
    }

    fn draw(&mut self, frame: &FrameInput, style: &StyleContext, surface: &mut dyn DrawSurface) {
        self.buf.clear();
        for (i, n) in frame.nodes.iter().enumerate() {
            let look = node_look(
                n,
                frame.selection,
                frame.highlighted,
                frame.center == Some(i),
                &style.palette,
            );
            let distance = n.position.distance(frame.camera_position);
            self.buf.push(NodeDraw {
                index: i,
                position: n.position,
                radius: n.radius * look.scale,
                lod: style.lod.level_for(distance),
                look,
            });
        }
        surface.draw_node_meshes(&self.buf);
    }
}

#[derive(Default)]
pub struct InstancedNodes {
    batch: InstanceBatch,
}

impl NodeStrategy for InstancedNodes {
    fn path(&self) -> RenderPath {
        RenderPath::Throughput
    }

    fn draw(&mut self, frame: &FrameInput, style: &StyleContext, surface: &mut dyn DrawSurface) {
        self.batch.clear();
        for (i, n) in frame.nodes.iter().enumerate() {
            let look = node_look(
                n,
                frame.selection,
                frame.highlighted,
                frame.center == Some(i),
                &style.palette,
            );
            let lin = look.color.to_linear();
            let boost = 1.0 + look.emissive;
            self.batch.positions.push(n.position);
            self.batch.radii.push(n.radius * look.scale);
            self.batch.colors.push([
                (lin.red * boost).min(1.0),
                (lin.green * boost).min(1.0),
                (lin.blue * boost).min(1.0),
                1.0,
            ]);
        }
        surface.draw_node_instances(&self.batch);
    }
}

/// Instanced nodes always use this geometry.
pub const INSTANCED_LOD: LodLevel = LodLevel::Medium;

#[derive(Default)]
pub struct IndividualEdges {
    buf: Vec<LineDraw>,
}

impl EdgeStrategy for IndividualEdges {
    fn path(&self) -> RenderPath {
        RenderPath::Individual
    }

    fn draw(&mut self, frame: &FrameInput, style: &StyleContext, surface: &mut dyn DrawSurface) {
        self.buf.clear();
        for link in frame.links {
            let look = edge_look(link, frame.nodes, frame.selection, frame.highlighted, &style.palette);
            let edge = edge_style(link.kind);
            let from = frame.nodes[link.source].position;
            let to = frame.nodes[link.target].position;
            match edge.dash {
                None => self.buf.push(LineDraw {
                    from,
                    to,
                    color: look.color,
                    width: edge.width,
                }),
                Some((dash, gap)) => {
                    for (a, b) in dash_segments(from, to, dash * DASH_UNIT, gap * DASH_UNIT) {
                        self.buf.push(LineDraw {
                            from: a,
                            to: b,
                            color: look.color,
                            width: edge.width,
                        });
                    }
                }
            }
        }
        surface.draw_edge_lines(&self.buf);
    }
}

#[derive(Default)]
pub struct BatchedEdges {
    batch: SegmentBatch,
}

impl EdgeStrategy for BatchedEdges {
    fn path(&self) -> RenderPath {
        RenderPath::Throughput
    }

    fn draw(&mut self, frame: &FrameInput, style: &StyleContext, surface: &mut dyn DrawSurface) {
        self.batch.clear();
        for link in frame.links {
            let look = edge_look(link, frame.nodes, frame.selection, frame.highlighted, &style.palette);
            self.batch.positions.push(frame.nodes[link.source].position);
            self.batch.positions.push(frame.nodes[link.target].position);
            self.batch.colors.push(look.color);
            self.batch.colors.push(look.color);
        }
        surface.draw_edge_segments(&self.batch);
    }
}

/// Splits `from..to` into dash segments. Long edges stretch the pattern so
/// one edge never produces more than a fixed number of pieces.
pub fn dash_segments(from: Vec3, to: Vec3, dash: f32, gap: f32) -> Vec<(Vec3, Vec3)> {
    let length = from.distance(to);
    let mut period = dash + gap;
    if length <= f32::EPSILON || period <= f32::EPSILON || dash <= 0.0 {
        return vec![(from, to)];
    }
    let mut dash = dash;
    let pieces = (length / period).ceil() as usize;
    if pieces > MAX_DASHES_PER_EDGE {
        let stretch = pieces as f32 / MAX_DASHES_PER_EDGE as f32;
        dash *= stretch;
        period *= stretch;
    }

    let dir = (to - from) / length;
    let mut out = Vec::new();
    let mut t = 0.0;
    while t < length {
        let end = (t + dash).min(length);
        out.push((from + dir * t, from + dir * end));
        t += period;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_pick_the_throughput_path_at_the_boundary() {
        assert_eq!(node_strategy_for(99, 100).path(), RenderPath::Individual);
        assert_eq!(node_strategy_for(100, 100).path(), RenderPath::Throughput);
        assert_eq!(edge_strategy_for(199, 200).path(), RenderPath::Individual);
        assert_eq!(edge_strategy_for(200, 200).path(), RenderPath::Throughput);
    }

    #[test]
    fn dashes_cover_the_edge_without_overrunning() {
        let segs = dash_segments(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 2.0, 1.0);
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0], (Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)));
        assert_eq!(segs[3].1, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn dash_count_is_capped() {
        let segs = dash_segments(Vec3::ZERO, Vec3::new(10_000.0, 0.0, 0.0), 0.5, 0.2);
        assert!(segs.len() <= MAX_DASHES_PER_EDGE + 1);
    }

    #[test]
    fn degenerate_edges_stay_whole() {
        let segs = dash_segments(Vec3::ONE, Vec3::ONE, 1.0, 1.0);
        assert_eq!(segs, vec![(Vec3::ONE, Vec3::ONE)]);
    }
}
