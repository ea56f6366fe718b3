//! Grid construction parameters.

use crate::models::WorldPoint;
use serde::{Deserialize, Serialize};

/// Default box-blur radius applied to terrain penalties.
pub const DEFAULT_BLUR_RADIUS: usize = 3;
/// Default penalty added to unwalkable cells before blurring.
pub const DEFAULT_OBSTACLE_PROXIMITY_PENALTY: u32 = 10;

/// Configuration for sampling the world into a grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// World-space centre of the grid
    pub origin: WorldPoint,
    /// Extent along x in world units
    pub world_width: f64,
    /// Extent along y in world units
    pub world_depth: f64,
    /// Half the width of a node; node diameter is twice this
    pub node_radius: f64,
    /// Half-width of the penalty smoothing window (0 disables smoothing)
    pub blur_radius: usize,
    /// Extra penalty on unwalkable cells so blurred costs discourage hugging obstacles
    pub obstacle_proximity_penalty: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            origin: WorldPoint::new(0.0, 0.0),
            world_width: 30.0,
            world_depth: 30.0,
            node_radius: 0.5,
            blur_radius: DEFAULT_BLUR_RADIUS,
            obstacle_proximity_penalty: DEFAULT_OBSTACLE_PROXIMITY_PENALTY,
        }
    }
}

impl GridConfig {
    /// Config covering `width x depth` world units centred on `origin`.
    pub fn new(origin: WorldPoint, world_width: f64, world_depth: f64, node_radius: f64) -> Self {
        Self {
            origin,
            world_width,
            world_depth,
            node_radius,
            ..Self::default()
        }
    }

    pub fn with_blur_radius(mut self, blur_radius: usize) -> Self {
        self.blur_radius = blur_radius;
        self
    }

    pub fn with_obstacle_proximity_penalty(mut self, penalty: u32) -> Self {
        self.obstacle_proximity_penalty = penalty;
        self
    }

    pub fn node_diameter(&self) -> f64 {
        self.node_radius * 2.0
    }
}
