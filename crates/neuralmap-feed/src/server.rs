use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use neuralmap_core::Msg;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::watch;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

pub async fn run(sock_path: &str, snapshots: watch::Receiver<Msg>) -> Result<()> {
    // Clean stale socket
    let _ = std::fs::remove_file(sock_path);
    let listener =
        UnixListener::bind(sock_path).with_context(|| format!("bind UDS {sock_path}"))?;
    tracing::info!(sock_path, "neuralmap-feed listening");

    loop {
        let (stream, _addr) = listener.accept().await?;
        tracing::info!("viewer connected");
        let snapshots = snapshots.clone();
        tokio::spawn(async move {
            match serve_client(stream, snapshots).await {
                Ok(()) => tracing::info!("viewer disconnected"),
                Err(e) => tracing::warn!("viewer connection failed: {e:#}"),
            }
        });
    }
}

async fn send<S>(framed: &mut Framed<S, LengthDelimitedCodec>, msg: &Msg) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed.send(Bytes::from(serde_json::to_vec(msg)?)).await?;
    Ok(())
}

/// Greets a viewer, sends the current snapshot, then streams every later
/// snapshot while answering the viewer's messages.
pub async fn serve_client<S>(stream: S, mut snapshots: watch::Receiver<Msg>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
    let hello = Msg::Hello {
        version: env!("CARGO_PKG_VERSION").into(),
    };
    send(&mut framed, &hello).await?;
    let current = snapshots.borrow_and_update().clone();
    send(&mut framed, &current).await?;

    loop {
        tokio::select! {
            frame = framed.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                let bytes = frame.context("read frame")?;
                match serde_json::from_slice::<Msg>(&bytes) {
                    Ok(msg) => {
                        if let Some(reply) = respond(&msg) {
                            send(&mut framed, &reply).await?;
                        }
                    }
                    Err(e) => tracing::warn!("decode error: {e}"),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let latest = snapshots.borrow_and_update().clone();
                send(&mut framed, &latest).await?;
            }
        }
    }
}

fn respond(msg: &Msg) -> Option<Msg> {
    match msg {
        Msg::Ping => return Some(Msg::Pong),
        Msg::Hello { version } => tracing::info!(%version, "viewer hello"),
        Msg::NodeClicked { id } => tracing::info!(%id, "node clicked"),
        Msg::NodeHovered { id: Some(id) } => tracing::debug!(%id, "node hovered"),
        Msg::NodeHovered { id: None } => tracing::debug!("hover cleared"),
        other => tracing::debug!(?other, "ignored viewer message"),
    }
    None
}
