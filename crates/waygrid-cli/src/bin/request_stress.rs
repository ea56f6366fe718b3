//! CLI tool that floods the path coordinator with requests.
//!
//! Submits from several concurrent tasks, waits for every ticket, then
//! reports throughput and the coordinator's own counters.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waygrid_cli::{corner_requests, random_requests, seeded_requests, RouteRequest};
use waygrid_core::{Grid, PathResult, Pathfinder};
use waygrid_server::{Config, CoordinatorError, PathCoordinator};

/// Request sets to submit
#[derive(Debug, Clone, ValueEnum)]
enum ScenarioType {
    /// Random start/goal pairs on walkable cells
    Random,
    /// Corner-to-corner crossings, repeated
    Corners,
}

/// Load-test the serialized path coordinator
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario to run
    #[arg(long, value_enum, default_value = "random")]
    scenario: ScenarioType,

    /// Total number of requests
    #[arg(long, default_value_t = 500)]
    count: usize,

    /// Number of concurrent submitting tasks
    #[arg(long, default_value_t = 8)]
    submitters: usize,

    /// Seed for reproducible random requests
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("waygrid_server=warn".parse()?))
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let map = config.load_map().context("failed to load terrain map")?;
    let grid = Grid::build(&config.grid_config(&map), &map).context("failed to build grid")?;

    let requests: Vec<RouteRequest> = match args.scenario {
        ScenarioType::Random => match args.seed {
            Some(seed) => seeded_requests(&grid, args.count, seed),
            None => random_requests(&grid, args.count),
        },
        ScenarioType::Corners => corner_requests(&grid)
            .into_iter()
            .cycle()
            .take(args.count)
            .collect(),
    };
    anyhow::ensure!(!requests.is_empty(), "map has no walkable cells to route between");

    println!(
        "\nScenario: {:?} | requests={} submitters={} grid={}x{}",
        args.scenario,
        requests.len(),
        args.submitters,
        grid.size_x(),
        grid.size_y()
    );

    let coordinator = Arc::new(PathCoordinator::spawn(Pathfinder::new(grid)));
    let submitters = args.submitters.max(1);
    let chunk = requests.len().div_ceil(submitters);
    let started = Instant::now();

    let batches = requests.chunks(chunk).map(|batch| {
        let coordinator = coordinator.clone();
        let batch = batch.to_vec();
        tokio::spawn(async move {
            let mut tickets = Vec::with_capacity(batch.len());
            for request in &batch {
                tickets.push(coordinator.request(request.start, request.goal)?);
            }
            let results = join_all(tickets)
                .await
                .into_iter()
                .collect::<Result<Vec<PathResult>, CoordinatorError>>()?;
            Ok::<_, CoordinatorError>(results)
        })
    });

    let mut succeeded = 0usize;
    let mut total_visited = 0usize;
    for joined in join_all(batches).await {
        for result in joined.context("submitter task panicked")?? {
            if result.success {
                succeeded += 1;
            }
            total_visited += result.nodes_visited;
        }
    }
    let elapsed = started.elapsed();

    let stats = coordinator.stats();
    let coordinator = Arc::try_unwrap(coordinator)
        .map_err(|_| anyhow::anyhow!("coordinator still shared after submitters finished"))?;
    coordinator.shutdown().await?;

    let completed = stats.completed.max(1) as f64;
    println!(
        "Result: {} / {} succeeded in {:.2?} ({:.0} req/s, avg nodes={:.0})",
        succeeded,
        stats.completed,
        elapsed,
        stats.completed as f64 / elapsed.as_secs_f64().max(1e-9),
        total_visited as f64 / completed
    );
    println!("Stats: {}", serde_json::to_string(&stats)?);
    if stats.peak_in_flight > 1 {
        anyhow::bail!("coordinator ran {} searches at once", stats.peak_in_flight);
    }
    Ok(())
}
