use bevy::color::{Alpha, Color, LinearRgba};
use neuralmap_core::NodeId;
use std::collections::HashSet;

use crate::graph::model::{edge_style, node_style};
use crate::graph::SelectionState;
use crate::sim::{SimLink, SimNode};
use crate::util::config::RenderSettings;

const EMISSIVE_NORMAL: f32 = 0.3;
const EMISSIVE_SELECTED: f32 = 0.5;
const EMISSIVE_HIGHLIGHTED: f32 = 0.6;
const EMISSIVE_HOVERED: f32 = 0.8;
const HOVER_SCALE: f32 = 1.15;
const HOVER_BRIGHTEN: f32 = 1.5;
const MIN_EDGE_OPACITY: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub selection: Color,
    pub edge_highlight: Color,
    pub edge_base_opacity: f32,
    pub edge_highlight_opacity: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}

impl Palette {
    pub fn from_settings(cfg: &RenderSettings) -> Self {
        let [r, g, b] = cfg.selection_color;
        Self {
            selection: Color::srgb(r, g, b),
            edge_highlight: Color::WHITE,
            edge_base_opacity: cfg.edge_base_opacity,
            edge_highlight_opacity: cfg.edge_highlight_opacity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeLook {
    pub color: Color,
    pub emissive: f32,
    pub scale: f32,
    pub ring: bool,
    pub glow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLook {
    pub color: Color,
    pub highlighted: bool,
}

pub fn node_look(
    node: &SimNode,
    selection: &SelectionState,
    highlighted: &HashSet<NodeId>,
    is_center: bool,
    palette: &Palette,
) -> NodeLook {
    let style = node_style(node.node_type);
    let mut look = NodeLook {
        color: style.color,
        emissive: EMISSIVE_NORMAL,
        scale: 1.0,
        ring: false,
        glow: style.glow && is_center,
    };

    if highlighted.contains(&node.id) {
        look.emissive = EMISSIVE_HIGHLIGHTED;
    }
    if selection.is_selected(&node.id) {
        look.color = palette.selection;
        look.emissive = look.emissive.max(EMISSIVE_SELECTED);
        look.ring = true;
    }
    if selection.is_hovered(&node.id) {
        look.emissive = EMISSIVE_HOVERED;
        look.scale = HOVER_SCALE;
        if !look.ring {
            look.color = brighten(look.color, HOVER_BRIGHTEN);
        }
    }
    look
}

pub fn edge_look(
    link: &SimLink,
    nodes: &[SimNode],
    selection: &SelectionState,
    highlighted: &HashSet<NodeId>,
    palette: &Palette,
) -> EdgeLook {
    let touches = |id: &NodeId| {
        selection.is_selected(id) || selection.is_hovered(id) || highlighted.contains(id)
    };
    let is_hot = touches(&nodes[link.source].id) || touches(&nodes[link.target].id);
    if is_hot {
        return EdgeLook {
            color: palette
                .edge_highlight
                .with_alpha(palette.edge_highlight_opacity),
            highlighted: true,
        };
    }
    let opacity = (palette.edge_base_opacity * link.strength).max(MIN_EDGE_OPACITY);
    EdgeLook {
        color: edge_style(link.kind).color.with_alpha(opacity),
        highlighted: false,
    }
}

fn brighten(color: Color, factor: f32) -> Color {
    let lin = color.to_linear();
    Color::LinearRgba(LinearRgba::new(
        (lin.red * factor).min(1.0),
        (lin.green * factor).min(1.0),
        (lin.blue * factor).min(1.0),
        lin.alpha,
    ))
}
