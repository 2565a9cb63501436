use bevy::prelude::Event;
use neuralmap_core::NodeId;

/// A node was clicked (selection already applied).
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct NodeClicked(pub NodeId);

/// Hover moved to a node, or to nothing.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct NodeHovered(pub Option<NodeId>);

/// Ask the camera to fly to a node.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct FocusOnNode(pub NodeId);
