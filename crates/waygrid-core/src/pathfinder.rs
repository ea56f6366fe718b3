//! A* search over a [`Grid`].
//!
//! The pathfinder owns its grid, so every search has exclusive access to
//! the per-node bookkeeping. Node state is invalidated lazily: each search
//! bumps an epoch counter and a node resets itself the first time the new
//! search touches it, avoiding an O(N) sweep per request.

use crate::grid::{Grid, NodeId};
use crate::heap::IndexedHeap;
use crate::models::{FailureReason, PathResult, WorldPoint};
use crate::spatial::{octile_distance, step_cost};
use std::time::Instant;

/// Single-threaded A* engine bound to one grid.
#[derive(Debug)]
pub struct Pathfinder {
    grid: Grid,
    open: IndexedHeap<NodeId>,
    epoch: u32,
}

impl Pathfinder {
    pub fn new(grid: Grid) -> Self {
        let open = IndexedHeap::with_capacity(grid.max_size());
        Self {
            grid,
            open,
            epoch: 0,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Find a route between two world points.
    ///
    /// Never fails hard: unreachable or unwalkable endpoints come back as a
    /// [`PathResult`] with `success == false` and a [`FailureReason`].
    pub fn search(&mut self, start: WorldPoint, goal: WorldPoint) -> PathResult {
        let started = Instant::now();
        let result = self.run(start, goal);

        tracing::debug!(
            elapsed_us = started.elapsed().as_micros() as u64,
            nodes_visited = result.nodes_visited,
            waypoints = result.waypoints.len(),
            success = result.success,
            "Path search finished"
        );
        result
    }

    fn run(&mut self, start: WorldPoint, goal: WorldPoint) -> PathResult {
        let start_id = self.grid.node_at(start);
        let goal_id = self.grid.node_at(goal);

        if !self.grid.node(start_id).walkable {
            return PathResult::failed(FailureReason::StartUnwalkable, 0);
        }
        if !self.grid.node(goal_id).walkable {
            return PathResult::failed(FailureReason::GoalUnwalkable, 0);
        }
        if start_id == goal_id {
            return PathResult::failed(FailureReason::StartIsGoal, 0);
        }

        let epoch = self.begin_search();
        let goal_coord = self.grid.node(goal_id).coord();

        let start_node = self.grid.node_mut(start_id);
        start_node.refresh(epoch);
        let start_h = octile_distance(start_node.coord(), goal_coord);
        start_node.record_path(0, start_h, None);
        self.open.push(self.grid.nodes_mut(), start_id);

        let mut nodes_visited = 0usize;
        while let Some(current) = self.open.pop(self.grid.nodes_mut()) {
            nodes_visited += 1;

            let current_node = self.grid.node_mut(current);
            current_node.close();
            let current_coord = current_node.coord();
            let current_g = current_node.g_cost();

            if current == goal_id {
                let waypoints = self.retrace(start_id, goal_id);
                return PathResult::found(waypoints, current_g, nodes_visited);
            }

            for neighbour in self.grid.neighbours(current) {
                let node = self.grid.node_mut(neighbour);
                node.refresh(epoch);
                if !node.walkable || node.is_closed() {
                    continue;
                }

                let coord = node.coord();
                let tentative = current_g
                    .saturating_add(step_cost(current_coord, coord))
                    .saturating_add(node.terrain_penalty);
                let known = node.g_cost();

                let queued = self.open.contains(self.grid.nodes(), neighbour);
                if tentative < known || !queued {
                    let h = octile_distance(coord, goal_coord);
                    self.grid
                        .node_mut(neighbour)
                        .record_path(tentative, h, Some(current));
                    if queued {
                        self.open.update_key(self.grid.nodes_mut(), neighbour);
                    } else {
                        self.open.push(self.grid.nodes_mut(), neighbour);
                    }
                }
            }
        }

        PathResult::failed(FailureReason::Unreachable, nodes_visited)
    }

    /// Start a new search generation. On counter wrap every node is
    /// zeroed so stale stamps can never collide with a live one.
    fn begin_search(&mut self) -> u32 {
        self.open.clear();
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.grid.reset_search_epochs();
            self.epoch = 1;
        }
        self.epoch
    }

    /// Follow parent links back from the goal and keep only the corners.
    fn retrace(&self, start: NodeId, goal: NodeId) -> Vec<WorldPoint> {
        let mut path = Vec::new();
        let mut cursor = Some(goal);
        while let Some(id) = cursor {
            path.push(self.grid.node(id).coord());
            if id == start {
                break;
            }
            cursor = self.grid.node(id).parent();
        }
        path.reverse();

        simplify(&path)
            .into_iter()
            .filter_map(|(x, y)| self.grid.id_at(x, y))
            .map(|id| self.grid.node(id).world_position)
            .collect()
    }
}

/// Reduce a start-to-goal cell path to the last cell of each straight run.
///
/// `path[0]` is the start and is never emitted. A route with no turns
/// collapses to just the goal.
fn simplify(path: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let direction = |from: (usize, usize), to: (usize, usize)| {
        (
            to.0 as isize - from.0 as isize,
            to.1 as isize - from.1 as isize,
        )
    };

    let mut corners = Vec::new();
    for i in 1..path.len() {
        let heading = direction(path[i - 1], path[i]);
        let is_last = i + 1 == path.len();
        if is_last || direction(path[i], path[i + 1]) != heading {
            corners.push(path[i]);
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;
    use crate::rules::GridConfig;
    use crate::sampler::OpenGround;

    /// Unit-cell grid whose node (x, y) sits at world (x + 0.5, y + 0.5).
    fn unit_grid<S: crate::sampler::CostSampler>(size_x: usize, size_y: usize, sampler: &S) -> Grid {
        let config = GridConfig::new(
            WorldPoint::new(size_x as f64 / 2.0, size_y as f64 / 2.0),
            size_x as f64,
            size_y as f64,
            0.5,
        )
        .with_blur_radius(0);
        Grid::build(&config, sampler).unwrap()
    }

    fn cell(x: usize, y: usize) -> WorldPoint {
        WorldPoint::new(x as f64 + 0.5, y as f64 + 0.5)
    }

    #[test]
    fn test_simplify_keeps_corners_and_goal() {
        assert_eq!(simplify(&[(0, 0), (1, 0), (2, 0)]), vec![(2, 0)]);
        assert_eq!(
            simplify(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2)]),
            vec![(2, 0), (2, 2)]
        );
        assert_eq!(
            simplify(&[(0, 0), (1, 1), (2, 1), (3, 2)]),
            vec![(1, 1), (2, 1), (3, 2)]
        );
        assert!(simplify(&[(4, 4)]).is_empty());
    }

    #[test]
    fn test_open_grid_cost_matches_octile_distance() {
        let mut finder = Pathfinder::new(unit_grid(12, 9, &OpenGround::default()));
        for (from, to) in [((0, 0), (11, 8)), ((3, 7), (10, 1)), ((5, 5), (5, 0)), ((0, 4), (9, 4))] {
            let result = finder.search(cell(from.0, from.1), cell(to.0, to.1));
            assert!(result.success, "{from:?} -> {to:?}");
            assert_eq!(result.path_cost, Some(octile_distance(from, to)));
            assert_eq!(result.waypoints.last(), Some(&cell(to.0, to.1)));
        }
    }

    #[test]
    fn test_straight_route_is_single_waypoint() {
        let mut finder = Pathfinder::new(unit_grid(10, 3, &OpenGround::default()));
        let result = finder.search(cell(0, 1), cell(9, 1));
        assert!(result.success);
        assert_eq!(result.waypoints, vec![cell(9, 1)]);
        assert_eq!(result.path_cost, Some(90));
        assert_eq!(result.failure, None);
    }

    #[test]
    fn test_open_grid_bent_route_diagonals_first() {
        let mut finder = Pathfinder::new(unit_grid(8, 8, &OpenGround::default()));
        assert_eq!(finder.open.capacity(), finder.grid().max_size());

        let result = finder.search(cell(0, 0), cell(5, 2));
        assert!(result.success);
        // (0,0) -> (1,1) -> (2,2) -> (3,2) -> (4,2) -> (5,2)
        assert_eq!(result.waypoints, vec![cell(2, 2), cell(5, 2)]);
        assert_eq!(result.path_cost, Some(2 * 14 + 3 * 10));
        assert_eq!(result.nodes_visited, 6);

        let grid = finder.into_grid();
        assert_eq!(grid.max_size(), 64);
        assert_eq!(grid.node(grid.id_at(5, 2).unwrap()).g_cost(), 58);
    }

    #[test]
    fn test_bent_route_has_corner_then_goal() {
        // Corridor: 3 diagonal steps then 3 straight ones
        let sampler = |p: WorldPoint| {
            let (x, y) = (p.x.floor() as i64, p.y.floor() as i64);
            if (x == y && x <= 3) || (y == 3 && (3..=6).contains(&x)) {
                Sample::open(0)
            } else {
                Sample::blocked()
            }
        };
        let mut finder = Pathfinder::new(unit_grid(8, 8, &sampler));
        let result = finder.search(cell(0, 0), cell(6, 3));
        assert!(result.success);
        assert_eq!(result.waypoints, vec![cell(3, 3), cell(6, 3)]);
        assert_eq!(result.path_cost, Some(3 * 14 + 3 * 10));
    }

    #[test]
    fn test_unwalkable_endpoints_fail_without_exploring() {
        let sampler = |p: WorldPoint| {
            if p.x < 1.0 && p.y < 1.0 {
                Sample::blocked()
            } else {
                Sample::open(0)
            }
        };
        let mut finder = Pathfinder::new(unit_grid(5, 5, &sampler));

        let result = finder.search(cell(0, 0), cell(4, 4));
        assert_eq!(result.failure, Some(FailureReason::StartUnwalkable));
        assert_eq!(result.nodes_visited, 0);
        assert!(result.waypoints.is_empty());

        let result = finder.search(cell(4, 4), cell(0, 0));
        assert_eq!(result.failure, Some(FailureReason::GoalUnwalkable));
        assert_eq!(result.nodes_visited, 0);
        assert!(!result.success);
    }

    #[test]
    fn test_walled_off_goal_is_unreachable() {
        // Full-height wall at x == 4
        let sampler = |p: WorldPoint| {
            if (4.0..5.0).contains(&p.x) {
                Sample::blocked()
            } else {
                Sample::open(0)
            }
        };
        let mut finder = Pathfinder::new(unit_grid(9, 6, &sampler));
        let result = finder.search(cell(1, 2), cell(7, 2));
        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureReason::Unreachable));
        // Every walkable cell left of the wall gets expanded
        assert_eq!(result.nodes_visited, 4 * 6);
    }

    #[test]
    fn test_start_equal_to_goal_is_reported() {
        let mut finder = Pathfinder::new(unit_grid(4, 4, &OpenGround::default()));
        let result = finder.search(cell(2, 2), WorldPoint::new(2.6, 2.4));
        assert_eq!(result.failure, Some(FailureReason::StartIsGoal));
        assert!(result.waypoints.is_empty());
    }

    #[test]
    fn test_route_detours_around_costly_terrain() {
        // Mud band across y == 2 except at x == 0
        let sampler = |p: WorldPoint| {
            if (2.0..3.0).contains(&p.y) && p.x > 1.0 {
                Sample::open(200)
            } else {
                Sample::open(0)
            }
        };
        let mut finder = Pathfinder::new(unit_grid(7, 5, &sampler));
        let result = finder.search(cell(6, 0), cell(6, 4));
        assert!(result.success);
        assert!(result.path_cost.unwrap() < 200);
        assert!(result.waypoints.iter().any(|p| p.x < 1.0));
    }

    #[test]
    fn test_repeated_searches_do_not_leak_state() {
        let sampler = |p: WorldPoint| {
            if (3.0..4.0).contains(&p.x) && p.y < 6.0 {
                Sample::blocked()
            } else {
                Sample::open(0)
            }
        };
        let mut finder = Pathfinder::new(unit_grid(8, 8, &sampler));
        let first = finder.search(cell(0, 0), cell(7, 0));
        let _ = finder.search(cell(7, 7), cell(0, 7));
        let _ = finder.search(cell(1, 1), cell(1, 1));
        let again = finder.search(cell(0, 0), cell(7, 0));
        assert!(first.success);
        assert_eq!(first, again);
    }

    #[test]
    fn test_epoch_wrap_resets_nodes() {
        let mut finder = Pathfinder::new(unit_grid(6, 6, &OpenGround::default()));
        let baseline = finder.search(cell(0, 0), cell(5, 3));
        finder.epoch = u32::MAX - 1;
        let before_wrap = finder.search(cell(0, 0), cell(5, 3));
        let after_wrap = finder.search(cell(0, 0), cell(5, 3));
        assert_eq!(finder.epoch, 1);
        assert_eq!(baseline, before_wrap);
        assert_eq!(baseline, after_wrap);
    }
}
