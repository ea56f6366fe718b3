//! Service configuration from environment.

use std::env;
use std::path::PathBuf;
use waygrid_core::rules::{DEFAULT_BLUR_RADIUS, DEFAULT_OBSTACLE_PROXIMITY_PENALTY};
use waygrid_core::GridConfig;

use crate::terrain::{MapError, TerrainMap};

#[derive(Debug, Clone)]
pub struct Config {
    /// Text map to load; the built-in map is used when unset
    pub map_path: Option<PathBuf>,
    /// World units covered by one map character
    pub map_cell_size: f64,
    pub node_radius: f64,
    pub blur_radius: usize,
    pub obstacle_penalty: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map_path: None,
            map_cell_size: 1.0,
            node_radius: 0.5,
            blur_radius: DEFAULT_BLUR_RADIUS,
            obstacle_penalty: DEFAULT_OBSTACLE_PROXIMITY_PENALTY,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing or unparsable values
    /// fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            map_path: lookup("WAYGRID_MAP")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            map_cell_size: lookup("WAYGRID_MAP_CELL_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.map_cell_size),
            node_radius: lookup("WAYGRID_NODE_RADIUS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.node_radius),
            blur_radius: lookup("WAYGRID_BLUR_RADIUS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.blur_radius),
            obstacle_penalty: lookup("WAYGRID_OBSTACLE_PENALTY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.obstacle_penalty),
        }
    }

    /// Load the configured map, or the built-in one when no path is set.
    pub fn load_map(&self) -> Result<TerrainMap, MapError> {
        match &self.map_path {
            Some(path) => TerrainMap::load(path, self.map_cell_size),
            None => TerrainMap::builtin(self.map_cell_size),
        }
    }

    /// Grid covering `map` with this configuration's sampling parameters.
    pub fn grid_config(&self, map: &TerrainMap) -> GridConfig {
        map.grid_config(self.node_radius)
            .with_blur_radius(self.blur_radius)
            .with_obstacle_proximity_penalty(self.obstacle_penalty)
    }
}
