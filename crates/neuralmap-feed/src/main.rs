mod config;
mod reload;
mod server;
mod source;

use anyhow::Result;
use config::parse_args;
use neuralmap_core::Msg;
use tokio::sync::watch;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = parse_args()?;

    let graph = source::load_graph(&config.graph)?;
    let (snapshot_tx, snapshot_rx) = watch::channel(Msg::Snapshot { graph });

    // Dropping the watcher stops reloads.
    let _watcher = if config.watch {
        Some(reload::spawn(config.graph.clone(), snapshot_tx.clone())?)
    } else {
        None
    };

    tokio::select! {
        res = server::run(&config.socket, snapshot_rx) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            let _ = std::fs::remove_file(&config.socket);
            drop(snapshot_tx);
            Ok(())
        }
    }
}
