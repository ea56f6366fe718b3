//! Request sets for exercising a grid.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use waygrid_core::{Grid, NodeId, WorldPoint};

/// A named start/goal pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub name: String,
    pub start: WorldPoint,
    pub goal: WorldPoint,
}

/// `count` random requests between walkable cells, using the thread RNG.
pub fn random_requests(grid: &Grid, count: usize) -> Vec<RouteRequest> {
    requests_from_rng(grid, count, &mut rand::rng())
}

/// Reproducible variant of [`random_requests`].
pub fn seeded_requests(grid: &Grid, count: usize, seed: u64) -> Vec<RouteRequest> {
    requests_from_rng(grid, count, &mut StdRng::seed_from_u64(seed))
}

fn requests_from_rng<R: Rng + ?Sized>(grid: &Grid, count: usize, rng: &mut R) -> Vec<RouteRequest> {
    let walkable: Vec<NodeId> = grid
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.walkable)
        .map(|(index, _)| NodeId(index))
        .collect();
    if walkable.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|i| RouteRequest {
            name: format!("random-{i}"),
            start: random_point_in(grid, &walkable, rng),
            goal: random_point_in(grid, &walkable, rng),
        })
        .collect()
}

/// Random point inside a random walkable cell, jittered off the centre.
fn random_point_in<R: Rng + ?Sized>(grid: &Grid, cells: &[NodeId], rng: &mut R) -> WorldPoint {
    let id = cells[rng.random_range(0..cells.len())];
    let centre = grid.node(id).world_position;
    // Stay inside the cell so the point resolves back to it
    let reach = grid.node_diameter() * 0.45;
    WorldPoint::new(
        centre.x + rng.random_range(-reach..reach),
        centre.y + rng.random_range(-reach..reach),
    )
}

/// Corner-to-corner crossings between the walkable cells nearest each
/// corner of the grid.
pub fn corner_requests(grid: &Grid) -> Vec<RouteRequest> {
    let (max_x, max_y) = (grid.size_x() - 1, grid.size_y() - 1);
    let corners = [
        ("south-west", (0, 0)),
        ("south-east", (max_x, 0)),
        ("north-east", (max_x, max_y)),
        ("north-west", (0, max_y)),
    ];

    let mut requests = Vec::new();
    for (i, (from_name, from)) in corners.iter().enumerate() {
        let (to_name, to) = corners[(i + 2) % 4];
        let (Some(start), Some(goal)) = (nearest_walkable(grid, *from), nearest_walkable(grid, to)) else {
            continue;
        };
        requests.push(RouteRequest {
            name: format!("{from_name} -> {to_name}"),
            start: grid.node(start).world_position,
            goal: grid.node(goal).world_position,
        });
    }
    requests
}

fn nearest_walkable(grid: &Grid, target: (usize, usize)) -> Option<NodeId> {
    grid.nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.walkable)
        .min_by_key(|(_, node)| {
            let dx = node.grid_x.abs_diff(target.0);
            let dy = node.grid_y.abs_diff(target.1);
            dx * dx + dy * dy
        })
        .map(|(index, _)| NodeId(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use waygrid_core::{GridConfig, Sample};

    fn walled_grid() -> Grid {
        let config = GridConfig::new(WorldPoint::new(5.0, 5.0), 10.0, 10.0, 0.5).with_blur_radius(0);
        // Blocked south-west corner cell and a column at x == 5
        let sampler = |p: WorldPoint| {
            if (p.x < 1.0 && p.y < 1.0) || (5.0..6.0).contains(&p.x) {
                Sample::blocked()
            } else {
                Sample::open(0)
            }
        };
        Grid::build(&config, &sampler).unwrap()
    }

    #[test]
    fn test_random_requests_land_on_walkable_cells() {
        let grid = walled_grid();
        let requests = seeded_requests(&grid, 50, 7);
        assert_eq!(requests.len(), 50);
        for request in &requests {
            assert!(grid.node(grid.node_at(request.start)).walkable, "{request:?}");
            assert!(grid.node(grid.node_at(request.goal)).walkable, "{request:?}");
        }
    }

    #[test]
    fn test_seeded_requests_are_reproducible() {
        let grid = walled_grid();
        assert_eq!(seeded_requests(&grid, 10, 42), seeded_requests(&grid, 10, 42));
        assert_ne!(seeded_requests(&grid, 10, 42), seeded_requests(&grid, 10, 43));
    }

    #[test]
    fn test_fully_blocked_grid_yields_nothing() {
        let config = GridConfig::new(WorldPoint::default(), 4.0, 4.0, 0.5);
        let grid = Grid::build(&config, &|_: WorldPoint| Sample::blocked()).unwrap();
        assert!(random_requests(&grid, 5).is_empty());
        assert!(corner_requests(&grid).is_empty());
    }

    #[test]
    fn test_corner_requests_skip_blocked_corners() {
        let grid = walled_grid();
        let requests = corner_requests(&grid);
        assert_eq!(requests.len(), 4);

        let south_west = &requests[0];
        assert_eq!(south_west.name, "south-west -> north-east");
        // (0, 0) is blocked so the nearest open cell is used instead
        assert_ne!(grid.node(grid.node_at(south_west.start)).coord(), (0, 0));
        assert_eq!(grid.node(grid.node_at(south_west.goal)).coord(), (9, 9));
    }
}
