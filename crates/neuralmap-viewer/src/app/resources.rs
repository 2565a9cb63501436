use bevy::prelude::Resource;
use crossbeam_channel::Receiver;
use neuralmap_core::Msg;
use tokio::sync::mpsc::UnboundedSender;

use crate::net::Incoming;
use crate::util::config::ViewerConfig;

#[derive(Resource)]
pub struct NetRx(pub Receiver<Incoming>);

/// Outgoing notifications to the feed.
#[derive(Resource, Clone)]
pub struct NetTx(pub UnboundedSender<Msg>);

#[derive(Resource, Clone, Debug)]
pub struct Settings(pub ViewerConfig);
