//! Path coordinator integration tests.
//!
//! Exercises ordering, serialization and shutdown of the request queue
//! against a small in-memory map.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use waygrid_core::{FailureReason, Grid, Pathfinder, WorldPoint};
use waygrid_server::{CoordinatorError, PathCoordinator, TerrainMap};

const YARD: &str = "\
........
........
...#....
...#....
........
";

fn yard_grid() -> Grid {
    let map = TerrainMap::parse(YARD, 1.0).unwrap();
    let config = map.grid_config(0.5).with_blur_radius(0);
    Grid::build(&config, &map).unwrap()
}

fn cell(x: usize, y: usize) -> WorldPoint {
    WorldPoint::new(x as f64 + 0.5, y as f64 + 0.5)
}

/// Test that requests complete in submission order, one at a time.
#[tokio::test]
async fn test_requests_complete_in_fifo_order() {
    let coordinator = PathCoordinator::spawn(Pathfinder::new(yard_grid()));
    let order = Arc::new(Mutex::new(Vec::new()));
    let (done_tx, done_rx) = oneshot::channel();

    let log = order.clone();
    coordinator
        .submit(cell(0, 0), cell(7, 4), move |_| log.lock().unwrap().push("R1"))
        .unwrap();
    let log = order.clone();
    coordinator
        .submit(cell(7, 0), cell(0, 4), move |_| log.lock().unwrap().push("R2"))
        .unwrap();
    let log = order.clone();
    coordinator
        .submit(cell(0, 2), cell(7, 2), move |_| {
            log.lock().unwrap().push("R3");
            let _ = done_tx.send(());
        })
        .unwrap();

    done_rx.await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["R1", "R2", "R3"]);

    let stats = coordinator.stats();
    assert_eq!(stats.submitted, 3);
    assert_eq!(stats.completed, 3);
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.peak_in_flight, 1);

    coordinator.shutdown().await.unwrap();
}

/// Test that a ticket resolves to the same result as a direct search.
#[tokio::test]
async fn test_ticket_matches_direct_search() {
    let mut direct = Pathfinder::new(yard_grid());
    let expected = direct.search(cell(1, 1), cell(6, 2));

    let coordinator = PathCoordinator::spawn(Pathfinder::new(yard_grid()));
    let ticket = coordinator.request(cell(1, 1), cell(6, 2)).unwrap();
    let result = ticket.await.unwrap();

    assert!(result.success);
    assert_eq!(result, expected);
    assert_eq!(result.waypoints.last(), Some(&cell(6, 2)));

    coordinator.shutdown().await.unwrap();
}

/// Test that concurrent submitters never see more than one search in flight.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submitters_are_serialized() {
    let coordinator = Arc::new(PathCoordinator::spawn(Pathfinder::new(yard_grid())));

    let mut tasks = JoinSet::new();
    for i in 0..16usize {
        let coordinator = coordinator.clone();
        tasks.spawn(async move {
            let ticket = coordinator.request(cell(i % 3, 0), cell(7, 4 - i % 2)).unwrap();
            ticket.await.unwrap()
        });
    }
    while let Some(joined) = tasks.join_next().await {
        assert!(joined.unwrap().success);
    }

    let stats = coordinator.stats();
    assert_eq!(stats.submitted, 16);
    assert_eq!(stats.completed, 16);
    assert_eq!(stats.peak_in_flight, 1);

    let coordinator = Arc::try_unwrap(coordinator)
        .ok()
        .expect("all submitters finished");
    coordinator.shutdown().await.unwrap();
}

/// Test that failed searches are delivered and counted, not raised.
#[tokio::test]
async fn test_failures_are_counted() {
    let coordinator = PathCoordinator::spawn(Pathfinder::new(yard_grid()));

    let blocked = coordinator.request(cell(3, 1), cell(7, 4)).unwrap().await.unwrap();
    assert!(!blocked.success);
    assert_eq!(blocked.failure, Some(FailureReason::StartUnwalkable));
    assert!(blocked.waypoints.is_empty());

    let fine = coordinator.request(cell(0, 4), cell(7, 0)).unwrap().await.unwrap();
    assert!(fine.success);

    let stats = coordinator.stats();
    assert_eq!((stats.succeeded, stats.failed), (1, 1));

    coordinator.shutdown().await.unwrap();
}

/// Test that shutdown drains everything already queued.
#[tokio::test]
async fn test_shutdown_drains_queue() {
    let coordinator = PathCoordinator::spawn(Pathfinder::new(yard_grid()));
    let finished = Arc::new(AtomicUsize::new(0));

    for i in 0..5 {
        let finished = finished.clone();
        coordinator
            .submit(cell(0, i % 5), cell(7, 4 - i % 5), move |_| {
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }

    let pathfinder = coordinator.shutdown().await.unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 5);
    assert_eq!(pathfinder.grid().max_size(), 40);
}

/// Test that a panicking completion is reported without stranding the queue.
#[tokio::test]
async fn test_panicking_completion_fails_worker() {
    let coordinator = PathCoordinator::spawn(Pathfinder::new(yard_grid()));

    coordinator
        .submit(cell(0, 0), cell(7, 0), |_| panic!("completion blew up"))
        .unwrap();
    let next = coordinator.request(cell(0, 4), cell(7, 4)).unwrap();

    assert!(next.await.unwrap().success);
    assert_eq!(coordinator.stats().completed, 2);
    assert!(matches!(
        coordinator.shutdown().await,
        Err(CoordinatorError::WorkerFailed(_))
    ));
}
