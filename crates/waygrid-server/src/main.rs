//! waygrid server - answers path requests read as JSON lines on stdin

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waygrid_core::{Grid, Pathfinder};
use waygrid_server::{serve, Config, PathCoordinator};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries responses only
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("waygrid_server=info".parse()?)
            .add_directive("waygrid_core=info".parse()?))
        .init();

    let config = Config::from_env();
    tracing::info!(?config, "Starting waygrid server...");

    let map = config.load_map().context("failed to load terrain map")?;
    let grid = Grid::build(&config.grid_config(&map), &map).context("failed to build grid")?;
    let (penalty_min, penalty_max) = grid.penalty_range();
    tracing::info!(
        map_width = map.width(),
        map_height = map.height(),
        nodes = grid.max_size(),
        penalty_min,
        penalty_max,
        "World ready"
    );

    let coordinator = PathCoordinator::spawn(Pathfinder::new(grid));
    let summary = serve(&coordinator, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    let stats = coordinator.stats();
    coordinator.shutdown().await?;

    tracing::info!(
        accepted = summary.accepted,
        skipped = summary.skipped,
        written = summary.written,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "Input closed, shutting down"
    );
    Ok(())
}
