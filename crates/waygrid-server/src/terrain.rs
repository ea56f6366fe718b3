//! Text-map terrain used as the service's world sampler.
//!
//! One character per map cell, rows listed north to south:
//!
//! | char  | meaning                   |
//! |-------|---------------------------|
//! | `#`   | blocked                   |
//! | `.`   | open ground, penalty 0    |
//! | `,`   | grass, penalty 5          |
//! | `~`   | mud, penalty 20           |
//! | `0-9` | open, penalty `digit * 10`|
//!
//! The map's south-west corner sits at world `(0, 0)`; each cell covers
//! `cell_size x cell_size` world units.

use std::path::{Path, PathBuf};
use thiserror::Error;
use waygrid_core::{CostSampler, GridConfig, Sample, WorldPoint};

pub const GRASS_PENALTY: u32 = 5;
pub const MUD_PENALTY: u32 = 20;

/// Map shipped with the server, used when no map path is configured.
pub const BUILTIN_MAP: &str = include_str!("../maps/courtyard.map");

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("map has no rows")]
    Empty,
    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown map character {found:?} at row {row}, column {column}")]
    UnknownCell {
        row: usize,
        column: usize,
        found: char,
    },
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),
}

#[derive(Debug, Clone)]
pub struct TerrainMap {
    width: usize,
    height: usize,
    cell_size: f64,
    /// Row-major, row 0 is the southern edge
    cells: Vec<Sample>,
}

impl TerrainMap {
    pub fn parse(text: &str, cell_size: f64) -> Result<Self, MapError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(MapError::InvalidCellSize(cell_size));
        }

        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        let width = rows.first().map(|row| row.chars().count()).ok_or(MapError::Empty)?;

        let mut cells = Vec::with_capacity(width * rows.len());
        // Text lists north first; store south first so y grows northward
        for (row, line) in rows.iter().enumerate().rev() {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (column, ch) in line.chars().enumerate() {
                cells.push(classify_char(ch).ok_or(MapError::UnknownCell { row, column, found: ch })?);
            }
        }

        Ok(Self {
            width,
            height: rows.len(),
            cell_size,
            cells,
        })
    }

    pub fn load(path: &Path, cell_size: f64) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, cell_size)
    }

    pub fn builtin(cell_size: f64) -> Result<Self, MapError> {
        Self::parse(BUILTIN_MAP, cell_size)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn world_width(&self) -> f64 {
        self.width as f64 * self.cell_size
    }

    pub fn world_depth(&self) -> f64 {
        self.height as f64 * self.cell_size
    }

    /// World-space centre of the map.
    pub fn centre(&self) -> WorldPoint {
        WorldPoint::new(self.world_width() / 2.0, self.world_depth() / 2.0)
    }

    /// Cell at `(column, row)` with row 0 on the southern edge.
    pub fn cell(&self, column: usize, row: usize) -> Option<Sample> {
        (column < self.width && row < self.height).then(|| self.cells[row * self.width + column])
    }

    /// Grid configuration that covers exactly this map.
    pub fn grid_config(&self, node_radius: f64) -> GridConfig {
        GridConfig::new(self.centre(), self.world_width(), self.world_depth(), node_radius)
    }
}

impl CostSampler for TerrainMap {
    fn classify(&self, point: WorldPoint) -> Sample {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Sample::blocked();
        }
        let column = (point.x / self.cell_size).floor().clamp(0.0, (self.width - 1) as f64) as usize;
        let row = (point.y / self.cell_size).floor().clamp(0.0, (self.height - 1) as f64) as usize;
        self.cells[row * self.width + column]
    }
}

fn classify_char(ch: char) -> Option<Sample> {
    match ch {
        '#' => Some(Sample::blocked()),
        '.' => Some(Sample::open(0)),
        ',' => Some(Sample::open(GRASS_PENALTY)),
        '~' => Some(Sample::open(MUD_PENALTY)),
        digit @ '0'..='9' => digit.to_digit(10).map(|d| Sample::open(d * 10)),
        _ => None,
    }
}
