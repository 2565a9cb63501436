use anyhow::{Context, Result};
use bytes::Bytes;
use crossbeam_channel::Sender;
use futures_util::{SinkExt, StreamExt};
use neuralmap_core::Msg;
use std::time::Duration;
use tokio::net::UnixStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::net::Incoming;

const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Runs the feed client on its own thread. Decoded messages go to `tx`;
/// notifications queued on `outgoing` are written to the socket.
pub fn spawn_client(sock_path: String, tx: Sender<Incoming>, outgoing: UnboundedReceiver<Msg>) {
    let spawned = std::thread::Builder::new()
        .name("neuralmap-feed".into())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(Incoming::error(sock_path, format!("tokio runtime: {e}")));
                    return;
                }
            };
            rt.block_on(run_forever(sock_path, tx, outgoing));
        });
    if let Err(e) = spawned {
        tracing::error!("failed to spawn feed thread: {e}");
    }
}

async fn run_forever(sock_path: String, tx: Sender<Incoming>, mut outgoing: UnboundedReceiver<Msg>) {
    loop {
        match run(&sock_path, &tx, &mut outgoing).await {
            Ok(()) => {
                if tx.send(Incoming::disconnected(sock_path.clone())).is_err() {
                    return;
                }
            }
            Err(e) => {
                if tx
                    .send(Incoming::error(sock_path.clone(), format!("{e:#}")))
                    .is_err()
                {
                    return;
                }
            }
        }
        tokio::time::sleep(RETRY_DELAY).await;
    }
}

async fn run(
    sock_path: &str,
    tx: &Sender<Incoming>,
    outgoing: &mut UnboundedReceiver<Msg>,
) -> Result<()> {
    let stream = UnixStream::connect(sock_path)
        .await
        .with_context(|| format!("connect UDS {sock_path}"))?;
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
    let _ = tx.send(Incoming::connected(sock_path.to_string()));

    let hello = Msg::Hello {
        version: env!("CARGO_PKG_VERSION").into(),
    };
    framed.send(Bytes::from(serde_json::to_vec(&hello)?)).await?;

    loop {
        tokio::select! {
            frame = framed.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                let bytes = frame.context("read frame")?;
                let incoming = match serde_json::from_slice::<Msg>(&bytes) {
                    Ok(msg) => Incoming::message(sock_path.to_string(), msg),
                    Err(e) => Incoming::error(sock_path.to_string(), format!("decode error: {e}")),
                };
                if tx.send(incoming).is_err() {
                    return Ok(());
                }
            }
            msg = outgoing.recv() => {
                let Some(msg) = msg else {
                    return Ok(());
                };
                framed.send(Bytes::from(serde_json::to_vec(&msg)?)).await?;
            }
        }
    }
}
