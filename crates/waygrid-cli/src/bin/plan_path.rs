//! CLI tool to plan a single route on a terrain map and draw it.
//!
//! Map and grid settings default to the server's environment
//! configuration; flags override them.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waygrid_cli::{parse_point, render_route};
use waygrid_core::{Grid, Pathfinder, WorldPoint};
use waygrid_server::Config;

/// Plan a path between two world points
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Start point as x,y in world units
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    start: WorldPoint,

    /// Goal point as x,y in world units
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    goal: WorldPoint,

    /// Text map to plan on (defaults to WAYGRID_MAP, then the built-in map)
    #[arg(long)]
    map: Option<PathBuf>,

    /// World units per map character
    #[arg(long)]
    cell_size: Option<f64>,

    /// Node radius in world units
    #[arg(long)]
    node_radius: Option<f64>,

    /// Penalty blur radius in nodes
    #[arg(long)]
    blur: Option<usize>,

    /// Print the result as JSON instead of drawing it
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("waygrid_core=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(map) = args.map {
        config.map_path = Some(map);
    }
    if let Some(cell_size) = args.cell_size {
        config.map_cell_size = cell_size;
    }
    if let Some(node_radius) = args.node_radius {
        config.node_radius = node_radius;
    }
    if let Some(blur) = args.blur {
        config.blur_radius = blur;
    }

    let map = config.load_map().context("failed to load terrain map")?;
    let grid = Grid::build(&config.grid_config(&map), &map).context("failed to build grid")?;
    let mut pathfinder = Pathfinder::new(grid);

    let result = pathfinder.search(args.start, args.goal);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print!("{}", render_route(pathfinder.grid(), args.start, &result.waypoints));
    println!();
    match (result.success, result.failure) {
        (true, _) => {
            println!(
                "Result: OK | waypoints={} cost={} nodes={}",
                result.waypoints.len(),
                result.path_cost.unwrap_or_default(),
                result.nodes_visited
            );
            for (i, point) in result.waypoints.iter().enumerate() {
                println!("  {:>2}: ({:.2}, {:.2})", i + 1, point.x, point.y);
            }
        }
        (false, failure) => {
            println!("Result: FAIL | reason={:?} nodes={}", failure, result.nodes_visited);
        }
    }
    Ok(())
}
