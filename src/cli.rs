use crate::config::load_config;
use crate::route_dump::{ConnectionDump, RouteDump, write_route_dump, write_route_dump_file};
use crate::routing::Router;
use crate::scene::{Scene, parse_scene};
use anyhow::Result;
use clap::Parser;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "splice-route",
    version,
    about = "Orthogonal routing for fiber splice diagrams"
)]
pub struct Args {
    /// Scene file (JSON or JSON5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the route dump. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Router config JSON file (weights, tolerances, strategy offsets)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Reroute only this connection
    #[arg(long = "connection")]
    pub connection: Option<String>,

    /// Include every scored candidate in the dump
    #[arg(long = "candidates")]
    pub candidates: bool,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let router = Router::new(config.router);

    let input = read_input(args.input.as_deref())?;
    let mut scene = parse_scene(&input)?;
    let dump = route_scene(&mut scene, &router, args.connection.as_deref(), args.candidates)?;

    match args.output.as_deref() {
        Some(path) => write_route_dump_file(path, &dump),
        None => write_route_dump(io::stdout().lock(), &dump),
    }
}

/// Reroutes the selected connection (or all of them, in store order) and
/// reports the result. Hand-edited connections are re-anchored, not rerouted.
pub fn route_scene(
    scene: &mut Scene,
    router: &Router,
    only: Option<&str>,
    keep_candidates: bool,
) -> Result<RouteDump> {
    let ids: Vec<String> = match only {
        Some(id) => {
            if scene.connection(id).is_none() {
                return Err(anyhow::anyhow!("No connection named '{id}' in scene"));
            }
            vec![id.to_string()]
        }
        None => scene.connections.iter().map(|c| c.id.clone()).collect(),
    };

    let mut dump = RouteDump::from_scene(scene);
    dump.connections.clear();
    for id in &ids {
        let outcome = scene.reroute_with_outcome(id, router)?;
        let Some(conn) = scene.connection(id) else {
            continue;
        };
        let mut entry = ConnectionDump::from_connection(conn);
        if let Some(outcome) = &outcome {
            entry = entry.with_outcome(outcome, keep_candidates);
        }
        dump.connections.push(entry);
    }
    Ok(dump)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "canvas": { "x": 0, "y": 0, "width": 1000, "height": 600 },
        "cables": [
            {
                "id": "in", "body": { "x": 40, "y": 100, "width": 40, "height": 200 },
                "orientation": "vertical", "role": "in",
                "fibers": [
                    { "id": "f1", "color": "blue", "rect": { "x": 80, "y": 137, "width": 20, "height": 6 }, "exit": { "x": 100, "y": 140 } }
                ]
            },
            {
                "id": "out", "body": { "x": 900, "y": 300, "width": 40, "height": 200 },
                "orientation": "vertical", "role": "out",
                "fibers": [
                    { "id": "g1", "color": "blue", "rect": { "x": 880, "y": 337, "width": 20, "height": 6 }, "exit": { "x": 880, "y": 340 } }
                ]
            }
        ],
        "connections": [ { "id": "c1", "endpoint1Id": "f1", "endpoint2Id": "g1" } ]
    }"#;

    #[test]
    fn routes_every_connection_in_scene() {
        let mut scene = parse_scene(SCENE).unwrap();
        let dump = route_scene(&mut scene, &Router::default(), None, true).unwrap();
        assert_eq!(dump.connections.len(), 1);
        let entry = &dump.connections[0];
        assert_eq!(entry.points[0], [108.0, 140.0]);
        assert_eq!(entry.points[entry.points.len() - 1], [872.0, 340.0]);
        assert!(entry.cost.is_some());
        assert!(!entry.candidates.is_empty());
    }

    #[test]
    fn unknown_connection_is_an_error() {
        let mut scene = parse_scene(SCENE).unwrap();
        assert!(route_scene(&mut scene, &Router::default(), Some("nope"), false).is_err());
    }

    #[test]
    fn parses_flags() {
        let args = Args::parse_from([
            "splice-route",
            "-i",
            "scene.json",
            "--connection",
            "c1",
            "--candidates",
        ]);
        assert_eq!(args.connection.as_deref(), Some("c1"));
        assert!(args.candidates);
        assert!(args.output.is_none());
    }
}
