//! Core data models shared by the grid, the search and the request queue.

use serde::{Deserialize, Serialize};

/// A point on the walkability plane, in world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to another point.
    pub fn distance(&self, other: &WorldPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Classification of a single world point produced by a [`CostSampler`].
///
/// [`CostSampler`]: crate::sampler::CostSampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub walkable: bool,
    /// Additive traversal cost for the cell; zero for plain ground.
    #[serde(default)]
    pub penalty: u32,
}

impl Sample {
    pub const fn open(penalty: u32) -> Self {
        Self {
            walkable: true,
            penalty,
        }
    }

    pub const fn blocked() -> Self {
        Self {
            walkable: false,
            penalty: 0,
        }
    }
}

/// Why a search produced no path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The start point resolved to an unwalkable cell.
    StartUnwalkable,
    /// The goal point resolved to an unwalkable cell.
    GoalUnwalkable,
    /// Start and goal resolved to the same cell, so there is nothing to walk.
    StartIsGoal,
    /// The open set emptied before the goal was reached.
    Unreachable,
    /// The worker stopped before the search could finish.
    Aborted,
}

/// Outcome of one path search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathResult {
    pub success: bool,
    /// Corner points and the goal, in walking order. Never includes the start.
    pub waypoints: Vec<WorldPoint>,
    pub nodes_visited: usize,
    /// Accumulated cost of the route (movement plus terrain penalties).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
}

impl PathResult {
    pub fn found(waypoints: Vec<WorldPoint>, path_cost: u32, nodes_visited: usize) -> Self {
        Self {
            success: !waypoints.is_empty(),
            waypoints,
            nodes_visited,
            path_cost: Some(path_cost),
            failure: None,
        }
    }

    pub fn failed(reason: FailureReason, nodes_visited: usize) -> Self {
        Self {
            success: false,
            waypoints: Vec::new(),
            nodes_visited,
            path_cost: None,
            failure: Some(reason),
        }
    }
}
