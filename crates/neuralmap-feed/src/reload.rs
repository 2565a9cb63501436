use anyhow::{Context, Result};
use neuralmap_core::Msg;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::source::load_graph;

const COALESCE_WINDOW: Duration = Duration::from_millis(250);

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
    )
}

/// Editors often replace files instead of writing in place, so the parent
/// directory is watched and events are matched by file name.
fn touches(paths: &[PathBuf], target: &Path) -> bool {
    let Some(name) = target.file_name() else {
        return false;
    };
    paths.iter().any(|p| p.file_name() == Some(name))
}

/// Reloads the graph file on change and publishes each good load as a new
/// snapshot. The returned watcher must be kept alive.
pub fn spawn(path: PathBuf, snapshots: watch::Sender<Msg>) -> Result<RecommendedWatcher> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (raw_tx, mut raw_rx) = mpsc::channel::<()>(64);
    let target = path.clone();
    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: std::result::Result<notify::Event, notify::Error>| match res {
            Ok(event) if is_change(&event.kind) && touches(&event.paths, &target) => {
                let _ = raw_tx.try_send(());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("watch error: {e}"),
        },
        notify::Config::default(),
    )?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watch {}", dir.display()))?;
    tracing::info!(path = %path.display(), "watching graph file");

    tokio::spawn(async move {
        let mut pending = false;
        let mut tick = tokio::time::interval(COALESCE_WINDOW);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                raw = raw_rx.recv() => {
                    if raw.is_none() {
                        return;
                    }
                    pending = true;
                }
                _ = tick.tick() => {
                    if !std::mem::take(&mut pending) {
                        continue;
                    }
                    match load_graph(&path) {
                        Ok(graph) => {
                            snapshots.send_replace(Msg::Snapshot { graph });
                        }
                        Err(e) => tracing::warn!("reload failed, keeping previous graph: {e:#}"),
                    }
                }
            }
        }
    });

    Ok(watcher)
}
