mod app;
mod graph;
mod input;
mod net;
mod render;
mod sim;
mod ui;
mod util;

use anyhow::Result;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use crate::app::resources::{NetRx, NetTx};
use crate::app::NeuralMapViewerPlugin;
use crate::util::{cli, config};

fn main() -> Result<()> {
    let opts = cli::parse_args()?;
    let mut cfg = config::load_or_default();
    opts.apply(&mut cfg);
    let initial_graph = cli::initial_graph(&opts, &cfg)?;

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "NeuralMap".into(),
            ..default()
        }),
        ..default()
    }))
    .add_plugins(EguiPlugin)
    .add_plugins(NeuralMapViewerPlugin {
        config: cfg.clone(),
        initial_graph,
    });

    if cfg.feed.auto_connect {
        let (tx, rx) = crossbeam_channel::unbounded();
        let (out_tx, out_rx) = tokio::sync::mpsc::unbounded_channel();
        net::spawn_client(cfg.feed.socket_path.clone(), tx, out_rx);
        app.insert_resource(NetRx(rx)).insert_resource(NetTx(out_tx));
    }

    app.run();
    Ok(())
}
