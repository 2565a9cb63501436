use anyhow::{Context, Result};
use neuralmap_core::GraphData;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::graph::demo::demo_graph;
use crate::util::config::ViewerConfig;

const DEMO_PROJECTS: usize = 6;
const DEMO_FANOUT: usize = 5;
const DEMO_DEPTH: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub graph: Option<PathBuf>,
    pub demo: bool,
    pub socket: Option<String>,
    pub no_feed: bool,
}

impl CliOptions {
    /// Command-line flags win over the config file.
    pub fn apply(&self, cfg: &mut ViewerConfig) {
        if self.demo {
            cfg.demo_mode = true;
        }
        if let Some(socket) = &self.socket {
            cfg.feed.socket_path = socket.clone();
            cfg.feed.auto_connect = true;
        }
        if self.no_feed {
            cfg.feed.auto_connect = false;
        }
    }
}

pub fn parse_args() -> Result<CliOptions> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = OsString>,
{
    let mut opts = CliOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--graph" {
            let Some(path) = args.next() else {
                anyhow::bail!("--graph expects a JSON file");
            };
            opts.graph = Some(PathBuf::from(path));
        } else if arg == "--socket" {
            let Some(path) = args.next() else {
                anyhow::bail!("--socket expects a path");
            };
            opts.socket = Some(path.to_string_lossy().into_owned());
        } else if arg == "--demo" {
            opts.demo = true;
        } else if arg == "--no-feed" {
            opts.no_feed = true;
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    if opts.graph.is_some() && opts.demo {
        anyhow::bail!("--graph and --demo are mutually exclusive");
    }
    Ok(opts)
}

/// Graph to show before any feed data arrives.
pub fn initial_graph(opts: &CliOptions, cfg: &ViewerConfig) -> Result<Option<GraphData>> {
    if let Some(path) = &opts.graph {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read graph file {}", path.display()))?;
        let graph: GraphData = serde_json::from_str(&raw)
            .with_context(|| format!("parse graph file {}", path.display()))?;
        return Ok(Some(graph));
    }
    if cfg.demo_mode {
        return Ok(Some(demo_graph(
            DEMO_PROJECTS,
            DEMO_FANOUT,
            DEMO_DEPTH,
            cfg.simulation.seed,
        )));
    }
    Ok(None)
}
