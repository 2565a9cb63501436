use bevy::color::Color;
use neuralmap_core::{EdgeKind, NodeType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub color: Color,
    pub base_size: f32,
    pub glow: bool,
}

pub fn node_style(ty: NodeType) -> NodeStyle {
    let (rgb, base_size) = match ty {
        NodeType::SelfNode => ((0xFF, 0xD7, 0x00), 6.0),
        NodeType::Concept => ((0x00, 0xBF, 0xFF), 3.0),
        NodeType::Project => ((0x10, 0xB9, 0x81), 4.0),
        NodeType::Doc => ((0x3B, 0x82, 0xF6), 2.4),
        NodeType::Idea => ((0xF5, 0x9E, 0x0B), 2.6),
        NodeType::Decision => ((0xEF, 0x44, 0x44), 2.8),
        NodeType::Memory => ((0x14, 0xB8, 0xA6), 2.2),
        NodeType::Task => ((0x06, 0xB6, 0xD4), 2.4),
        NodeType::Person => ((0x0E, 0xA5, 0xE9), 3.6),
        NodeType::Insight => ((0x22, 0xD3, 0xEE), 3.2),
        NodeType::Folder => ((0x6B, 0x72, 0x80), 3.0),
        NodeType::File => ((0x9C, 0xA3, 0xAF), 2.0),
        NodeType::Unknown => ((0x94, 0xA3, 0xB8), 2.0),
    };
    NodeStyle {
        color: Color::srgb_u8(rgb.0, rgb.1, rgb.2),
        base_size,
        glow: ty == NodeType::SelfNode,
    }
}

/// World-space radius of a node sphere.
pub fn node_radius(ty: NodeType, importance: f32) -> f32 {
    node_style(ty).base_size * (1.0 + importance.clamp(0.0, 10.0) / 20.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeWidth {
    Thin,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub color: Color,
    pub width: EdgeWidth,
    /// (dash, gap) in multiples of the renderer dash unit.
    pub dash: Option<(f32, f32)>,
    /// Link rest length as a fraction of the radial distance.
    pub rest_factor: f32,
}

pub fn edge_style(kind: EdgeKind) -> EdgeStyle {
    let (rgb, width, dash, rest_factor) = match kind {
        EdgeKind::ParentChild => ((0x63, 0x66, 0xF1), EdgeWidth::Wide, None, 0.5),
        EdgeKind::References => ((0x8B, 0x5C, 0xF6), EdgeWidth::Thin, Some((0.5, 0.2)), 1.0),
        EdgeKind::Imports => ((0x64, 0x74, 0x8B), EdgeWidth::Wide, None, 1.0),
        EdgeKind::Supports => ((0x22, 0xC5, 0x5E), EdgeWidth::Thin, None, 1.0),
        EdgeKind::Contradicts => ((0xEF, 0x44, 0x44), EdgeWidth::Thin, Some((0.3, 0.3)), 1.0),
        EdgeKind::Causes => ((0xF5, 0x9E, 0x0B), EdgeWidth::Thin, Some((0.5, 0.1)), 1.0),
        EdgeKind::SameTopic => ((0x06, 0xB6, 0xD4), EdgeWidth::Thin, Some((0.2, 0.1)), 1.0),
        EdgeKind::Sequence => ((0xEC, 0x48, 0x99), EdgeWidth::Thin, None, 1.0),
        EdgeKind::Unknown => ((0x94, 0xA3, 0xB8), EdgeWidth::Thin, None, 1.0),
    };
    EdgeStyle {
        color: Color::srgb_u8(rgb.0, rgb.1, rgb.2),
        width,
        dash,
        rest_factor,
    }
}

pub fn node_type_label(ty: NodeType) -> &'static str {
    match ty {
        NodeType::SelfNode => "Self",
        NodeType::Concept => "Concept",
        NodeType::Project => "Project",
        NodeType::Doc => "Document",
        NodeType::Idea => "Idea",
        NodeType::Decision => "Decision",
        NodeType::Memory => "Memory",
        NodeType::Task => "Task",
        NodeType::Person => "Person",
        NodeType::Insight => "Insight",
        NodeType::Folder => "Folder",
        NodeType::File => "File",
        NodeType::Unknown => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_grows_radius_within_bounds() {
        let small = node_radius(NodeType::Concept, 0.0);
        let big = node_radius(NodeType::Concept, 10.0);
        assert_eq!(small, 3.0);
        assert!((big - 4.5).abs() < 1e-6);
        assert_eq!(node_radius(NodeType::Concept, 99.0), big);
    }

    #[test]
    fn only_self_glows() {
        for ty in NodeType::ALL {
            assert_eq!(node_style(ty).glow, ty == NodeType::SelfNode);
        }
    }

    #[test]
    fn hierarchy_edges_are_shorter() {
        assert!(edge_style(EdgeKind::ParentChild).rest_factor < edge_style(EdgeKind::Supports).rest_factor);
        assert!(edge_style(EdgeKind::ParentChild).dash.is_none());
        assert_eq!(edge_style(EdgeKind::Contradicts).dash, Some((0.3, 0.3)));
    }
}
