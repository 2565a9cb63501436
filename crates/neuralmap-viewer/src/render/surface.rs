use bevy::color::Color;
use bevy::math::Vec3;

use crate::graph::model::EdgeWidth;
use crate::render::highlight::NodeLook;
use crate::render::lod::LodLevel;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SurfaceState {
    /// Waiting for the window and GPU resources.
    #[default]
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDraw {
    pub index: usize,
    pub position: Vec3,
    pub radius: f32,
    pub lod: LodLevel,
    pub look: NodeLook,
}

/// One entry per node, all sharing the same sphere geometry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceBatch {
    pub positions: Vec<Vec3>,
    pub radii: Vec<f32>,
    /// Linear RGBA.
    pub colors: Vec<[f32; 4]>,
}

impl InstanceBatch {
    pub fn clear(&mut self) {
        self.positions.clear();
        self.radii.clear();
        self.colors.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDraw {
    pub from: Vec3,
    pub to: Vec3,
    pub color: Color,
    pub width: EdgeWidth,
}

/// Line-list geometry: two vertices per segment, one color per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentBatch {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Color>,
}

impl SegmentBatch {
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
    }

    pub fn segment_count(&self) -> usize {
        self.positions.len() / 2
    }
}

/// Everything the renderer needs from the graphics backend.
pub trait DrawSurface {
    fn draw_node_meshes(&mut self, nodes: &[NodeDraw]);
    fn draw_node_instances(&mut self, batch: &InstanceBatch);
    fn draw_edge_lines(&mut self, lines: &[LineDraw]);
    fn draw_edge_segments(&mut self, batch: &SegmentBatch);
    fn release_nodes(&mut self);
    fn release_edges(&mut self);
    fn resize(&mut self, width: f32, height: f32);
}
