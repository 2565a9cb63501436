pub mod protocol;
pub mod uds;

use bevy::prelude::*;
use neuralmap_core::Msg;

use crate::app::events::{NodeClicked, NodeHovered};
use crate::app::resources::{NetRx, NetTx};
use crate::graph::{FeedStatus, GraphStore};

pub use protocol::{Incoming, IncomingKind};
pub use uds::spawn_client;

/// Upper bound on messages drained per frame.
const MAX_PER_FRAME: usize = 100_000;

/// Applies one feed item to the store. Returns a reply to send, if any.
pub fn apply_incoming(store: &mut GraphStore, incoming: Incoming) -> Option<Msg> {
    match incoming.kind {
        IncomingKind::Connected => {
            tracing::info!(stream = %incoming.stream, "feed connected");
            store.feed = FeedStatus::Connected(incoming.stream);
        }
        IncomingKind::Disconnected => {
            tracing::info!(stream = %incoming.stream, "feed disconnected");
            store.feed = FeedStatus::Offline;
        }
        IncomingKind::Error(e) => {
            tracing::warn!(stream = %incoming.stream, "feed error: {e}");
            store.feed = FeedStatus::Error(e);
        }
        IncomingKind::Message(Msg::Ping) => return Some(Msg::Pong),
        IncomingKind::Message(Msg::Hello { version }) => {
            tracing::debug!(%version, "feed hello");
        }
        IncomingKind::Message(msg) => {
            if !store.apply(msg) {
                tracing::debug!("ignored feed message");
            }
        }
    }
    None
}

pub fn pump_network(
    mut store: ResMut<GraphStore>,
    rx: Option<Res<NetRx>>,
    tx: Option<Res<NetTx>>,
) {
    let Some(rx) = rx else {
        return;
    };
    for incoming in rx.0.try_iter().take(MAX_PER_FRAME) {
        if let Some(reply) = apply_incoming(&mut store, incoming) {
            if let Some(tx) = &tx {
                let _ = tx.0.send(reply);
            }
        }
    }
}

pub fn forward_notifications(
    mut clicked: EventReader<NodeClicked>,
    mut hovered: EventReader<NodeHovered>,
    tx: Option<Res<NetTx>>,
) {
    let Some(tx) = tx else {
        clicked.clear();
        hovered.clear();
        return;
    };
    for NodeClicked(id) in clicked.read() {
        let _ = tx.0.send(Msg::NodeClicked { id: id.clone() });
    }
    for NodeHovered(id) in hovered.read() {
        let _ = tx.0.send(Msg::NodeHovered { id: id.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuralmap_core::{GraphData, Node, NodeId, NodeType};

    fn msg(m: Msg) -> Incoming {
        Incoming::message("test".into(), m)
    }

    #[test]
    fn snapshot_and_commands_reach_the_store() {
        let mut store = GraphStore::default();
        let graph = GraphData {
            nodes: vec![
                Node::new("me", NodeType::SelfNode, "Me"),
                Node::new("a", NodeType::Idea, "A").with_parent("me"),
            ],
            edges: vec![],
        };
        assert!(apply_incoming(&mut store, msg(Msg::Snapshot { graph })).is_none());
        assert_eq!(store.nodes().len(), 2);

        apply_incoming(
            &mut store,
            msg(Msg::SelectNodes {
                ids: vec![NodeId::from("a"), NodeId::from("ghost")],
            }),
        );
        assert_eq!(store.selection().selected, vec![NodeId::from("a")]);

        apply_incoming(&mut store, msg(Msg::FocusOnNode { id: NodeId::from("a") }));
        assert_eq!(store.take_focus_request(), Some(NodeId::from("a")));
    }

    #[test]
    fn ping_is_answered() {
        let mut store = GraphStore::default();
        assert_eq!(apply_incoming(&mut store, msg(Msg::Ping)), Some(Msg::Pong));
    }

    #[test]
    fn connection_state_is_tracked() {
        let mut store = GraphStore::default();
        apply_incoming(&mut store, Incoming::connected("sock".into()));
        assert_eq!(store.feed, FeedStatus::Connected("sock".into()));
        apply_incoming(&mut store, Incoming::error("sock".into(), "boom".into()));
        assert_eq!(store.feed, FeedStatus::Error("boom".into()));
        apply_incoming(&mut store, Incoming::disconnected("sock".into()));
        assert_eq!(store.feed, FeedStatus::Offline);
    }
}
