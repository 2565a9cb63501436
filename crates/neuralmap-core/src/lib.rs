use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of a knowledge node. Unrecognised strings on the wire map to `Unknown`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[serde(rename = "self")]
    SelfNode,
    Concept,
    Project,
    Doc,
    Idea,
    Decision,
    Memory,
    Task,
    Person,
    Insight,
    Folder,
    File,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NodeType {
    pub const ALL: [NodeType; 13] = [
        NodeType::SelfNode,
        NodeType::Concept,
        NodeType::Project,
        NodeType::Doc,
        NodeType::Idea,
        NodeType::Decision,
        NodeType::Memory,
        NodeType::Task,
        NodeType::Person,
        NodeType::Insight,
        NodeType::Folder,
        NodeType::File,
        NodeType::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::SelfNode => "self",
            NodeType::Concept => "concept",
            NodeType::Project => "project",
            NodeType::Doc => "doc",
            NodeType::Idea => "idea",
            NodeType::Decision => "decision",
            NodeType::Memory => "memory",
            NodeType::Task => "task",
            NodeType::Person => "person",
            NodeType::Insight => "insight",
            NodeType::Folder => "folder",
            NodeType::File => "file",
            NodeType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    ParentChild,
    References,
    Imports,
    Supports,
    Contradicts,
    Causes,
    SameTopic,
    Sequence,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::ParentChild => "parent_child",
            EdgeKind::References => "references",
            EdgeKind::Imports => "imports",
            EdgeKind::Supports => "supports",
            EdgeKind::Contradicts => "contradicts",
            EdgeKind::Causes => "causes",
            EdgeKind::SameTopic => "same_topic",
            EdgeKind::Sequence => "sequence",
            EdgeKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    /// 0..=10; influences size and charge.
    #[serde(default)]
    pub importance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType, title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            node_type,
            title: title.into(),
            parent_id: None,
            importance: 0.0,
            summary: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_id = Some(NodeId::new(parent));
        self
    }

    pub fn with_importance(mut self, importance: f32) -> Self {
        self.importance = importance;
        self
    }

    pub fn importance_clamped(&self) -> f32 {
        if self.importance.is_finite() {
            self.importance.clamp(0.0, 10.0)
        } else {
            0.0
        }
    }
}

fn default_strength() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default = "default_strength", alias = "weight")]
    pub strength: f32,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        let source = NodeId::new(source);
        let target = NodeId::new(target);
        Self {
            id: format!("{}->{}:{}", source, target, kind.as_str()),
            source,
            target,
            kind,
            strength: 1.0,
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn strength_clamped(&self) -> f32 {
        if self.strength.is_finite() {
            self.strength.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum Msg {
    Hello { version: String },
    /// Full replacement of the graph. Never incremental.
    Snapshot { graph: GraphData },
    SetExpanded { ids: Vec<NodeId> },
    ToggleExpanded { id: NodeId },
    SetHighlighted { ids: Vec<NodeId> },
    SelectNodes { ids: Vec<NodeId> },
    FocusOnNode { id: NodeId },
    SetRadialDistance { distance: f32 },
    SetSidebarOpen { open: bool },
    /// Viewer -> feed notifications.
    NodeClicked { id: NodeId },
    NodeHovered { id: Option<NodeId> },
    Ping,
    Pong,
}
