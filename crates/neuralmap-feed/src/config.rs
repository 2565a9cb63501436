use anyhow::Result;
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub graph: PathBuf,
    pub socket: String,
    pub watch: bool,
}

pub fn runtime_sock_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        format!("{dir}/neuralmap.sock")
    } else {
        "/tmp/neuralmap.sock".to_string()
    }
}

pub fn parse_args() -> Result<FeedConfig> {
    parse_args_from(std::env::args_os().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<FeedConfig>
where
    I: IntoIterator<Item = OsString>,
{
    let mut graph = None;
    let mut socket = None;
    let mut watch = true;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        if arg == "--graph" {
            let Some(path) = args.next() else {
                anyhow::bail!("--graph expects a JSON file");
            };
            graph = Some(PathBuf::from(path));
        } else if arg == "--socket" {
            let Some(path) = args.next() else {
                anyhow::bail!("--socket expects a path");
            };
            socket = Some(path.to_string_lossy().into_owned());
        } else if arg == "--no-watch" {
            watch = false;
        } else {
            anyhow::bail!("unknown argument: {:?}", arg);
        }
    }

    let Some(graph) = graph else {
        anyhow::bail!("missing --graph <file.json>");
    };
    Ok(FeedConfig {
        graph,
        socket: socket.unwrap_or_else(runtime_sock_path),
        watch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn parses_graph_and_socket() {
        let config = parse_args_from(args(&["--graph", "g.json", "--socket", "/tmp/a.sock"]))
            .expect("config parsed");
        assert_eq!(config.graph, PathBuf::from("g.json"));
        assert_eq!(config.socket, "/tmp/a.sock");
        assert!(config.watch);
    }

    #[test]
    fn graph_is_required() {
        assert!(parse_args_from(args(&["--no-watch"])).is_err());
        assert!(parse_args_from(args(&["--graph"])).is_err());
    }

    #[test]
    fn no_watch_disables_reload() {
        let config =
            parse_args_from(args(&["--no-watch", "--graph", "g.json"])).expect("config parsed");
        assert!(!config.watch);
    }
}
