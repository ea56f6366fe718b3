//! Walkability grid sampled once from the world.
//!
//! The grid owns every [`Node`] in a flat arena addressed by [`NodeId`]
//! (`y * size_x + x`). Search bookkeeping lives on the nodes themselves and
//! is reused across searches; parent links are ids, never references.

use crate::error::{GridError, Result};
use crate::heap::{HeapArena, NOT_IN_HEAP};
use crate::models::WorldPoint;
use crate::rules::GridConfig;
use crate::sampler::CostSampler;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Cost of a node that the current search has not reached yet.
pub const INFINITE_COST: u32 = u32::MAX;

/// Neighbour offsets in enumeration order: `dx` outer, `dy` inner.
/// Search tie-breaking depends on this order staying fixed.
const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Index of a node in the grid arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// One grid cell with its cached search state.
#[derive(Debug, Clone)]
pub struct Node {
    pub grid_x: usize,
    pub grid_y: usize,
    pub walkable: bool,
    pub world_position: WorldPoint,
    /// Smoothed traversal penalty, fixed once the grid is built
    pub terrain_penalty: u32,

    g_cost: u32,
    h_cost: u32,
    parent: Option<NodeId>,
    heap_index: usize,
    closed: bool,
    /// Search that last wrote the fields above
    epoch: u32,
}

impl Node {
    fn new(grid_x: usize, grid_y: usize, walkable: bool, world_position: WorldPoint, penalty: u32) -> Self {
        Self {
            grid_x,
            grid_y,
            walkable,
            world_position,
            terrain_penalty: penalty,
            g_cost: INFINITE_COST,
            h_cost: 0,
            parent: None,
            heap_index: NOT_IN_HEAP,
            closed: false,
            epoch: 0,
        }
    }

    pub fn coord(&self) -> (usize, usize) {
        (self.grid_x, self.grid_y)
    }

    /// Cost from the start of the most recent search.
    pub fn g_cost(&self) -> u32 {
        self.g_cost
    }

    /// Heuristic estimate to the goal of the most recent search.
    pub fn h_cost(&self) -> u32 {
        self.h_cost
    }

    pub fn f_cost(&self) -> u32 {
        self.g_cost.saturating_add(self.h_cost)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn record_path(&mut self, g_cost: u32, h_cost: u32, parent: Option<NodeId>) {
        self.g_cost = g_cost;
        self.h_cost = h_cost;
        self.parent = parent;
    }

    /// Forget search state left by an older search.
    pub(crate) fn refresh(&mut self, epoch: u32) {
        if self.epoch != epoch {
            self.epoch = epoch;
            self.g_cost = INFINITE_COST;
            self.h_cost = 0;
            self.parent = None;
            self.heap_index = NOT_IN_HEAP;
            self.closed = false;
        }
    }

    pub(crate) fn reset_epoch(&mut self) {
        self.epoch = 0;
    }
}

/// The node arena doubles as heap storage: nodes order by total cost, then
/// by heuristic so ties favour nodes nearer the goal.
impl HeapArena for [Node] {
    type Handle = NodeId;

    fn heap_index(&self, item: NodeId) -> usize {
        self[item.0].heap_index
    }

    fn set_heap_index(&mut self, item: NodeId, index: usize) {
        self[item.0].heap_index = index;
    }

    fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        let (a, b) = (&self[a.0], &self[b.0]);
        a.f_cost()
            .cmp(&b.f_cost())
            .then_with(|| a.h_cost.cmp(&b.h_cost))
    }
}

/// Up to eight neighbouring ids, stored inline.
#[derive(Debug, Clone, Copy)]
pub struct Neighbours {
    ids: [NodeId; 8],
    len: usize,
}

impl Neighbours {
    pub fn as_slice(&self) -> &[NodeId] {
        &self.ids[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl IntoIterator for Neighbours {
    type Item = NodeId;
    type IntoIter = std::iter::Take<std::array::IntoIter<NodeId, 8>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter().take(self.len)
    }
}

/// Sampled walkability grid.
#[derive(Debug, Clone)]
pub struct Grid {
    origin: WorldPoint,
    world_width: f64,
    world_depth: f64,
    node_diameter: f64,
    size_x: usize,
    size_y: usize,
    nodes: Vec<Node>,
    penalty_min: u32,
    penalty_max: u32,
}

impl Grid {
    /// Sample one point per cell centre and smooth the resulting penalties.
    pub fn build<S>(config: &GridConfig, sampler: &S) -> Result<Self>
    where
        S: CostSampler + ?Sized,
    {
        let radius = config.node_radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(GridError::InvalidNodeRadius(radius));
        }
        let (width, depth) = (config.world_width, config.world_depth);
        if !width.is_finite() || !depth.is_finite() || width <= 0.0 || depth <= 0.0 {
            return Err(GridError::InvalidWorldSize { width, depth });
        }

        let diameter = config.node_diameter();
        let size_x = (width / diameter).round() as usize;
        let size_y = (depth / diameter).round() as usize;
        if size_x == 0 || size_y == 0 {
            return Err(GridError::EmptyGrid { size_x, size_y });
        }

        let bottom_left = WorldPoint::new(
            config.origin.x - width / 2.0,
            config.origin.y - depth / 2.0,
        );

        let mut nodes = Vec::with_capacity(size_x * size_y);
        for y in 0..size_y {
            for x in 0..size_x {
                let world_position = WorldPoint::new(
                    bottom_left.x + x as f64 * diameter + radius,
                    bottom_left.y + y as f64 * diameter + radius,
                );
                let sample = sampler.classify(world_position);
                let mut penalty = sample.penalty;
                if !sample.walkable {
                    penalty = penalty.saturating_add(config.obstacle_proximity_penalty);
                }
                nodes.push(Node::new(x, y, sample.walkable, world_position, penalty));
            }
        }

        let mut grid = Self {
            origin: config.origin,
            world_width: width,
            world_depth: depth,
            node_diameter: diameter,
            size_x,
            size_y,
            nodes,
            penalty_min: 0,
            penalty_max: 0,
        };
        grid.blur_penalties(config.blur_radius)?;

        let walkable = grid.nodes.iter().filter(|node| node.walkable).count();
        tracing::info!(
            size_x,
            size_y,
            walkable,
            blur_radius = config.blur_radius,
            "Built walkability grid"
        );
        Ok(grid)
    }

    pub fn size_x(&self) -> usize {
        self.size_x
    }

    pub fn size_y(&self) -> usize {
        self.size_y
    }

    /// Number of nodes; also the most a search can ever hold open.
    pub fn max_size(&self) -> usize {
        self.size_x * self.size_y
    }

    pub fn node_diameter(&self) -> f64 {
        self.node_diameter
    }

    /// Lowest and highest terrain penalty after smoothing.
    pub fn penalty_range(&self) -> (u32, u32) {
        (self.penalty_min, self.penalty_max)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Id of the node at grid coordinate `(x, y)`, if it is in bounds.
    pub fn id_at(&self, x: usize, y: usize) -> Option<NodeId> {
        (x < self.size_x && y < self.size_y).then_some(NodeId(y * self.size_x + x))
    }

    /// Nearest node to a world point.
    ///
    /// Points outside the grid snap to the border node rather than failing.
    pub fn node_at(&self, point: WorldPoint) -> NodeId {
        let percent_x = ((point.x - self.origin.x + self.world_width / 2.0) / self.world_width).clamp(0.0, 1.0);
        let percent_y = ((point.y - self.origin.y + self.world_depth / 2.0) / self.world_depth).clamp(0.0, 1.0);

        // NaN survives the clamp and casts to 0
        let x = ((self.size_x - 1) as f64 * percent_x).round() as usize;
        let y = ((self.size_y - 1) as f64 * percent_y).round() as usize;
        NodeId(y.min(self.size_y - 1) * self.size_x + x.min(self.size_x - 1))
    }

    /// In-bounds 8-connected neighbours of `id`, in a fixed order.
    pub fn neighbours(&self, id: NodeId) -> Neighbours {
        let node = &self.nodes[id.0];
        let mut out = Neighbours {
            ids: [NodeId(0); 8],
            len: 0,
        };
        for (dx, dy) in NEIGHBOUR_OFFSETS {
            let x = node.grid_x as isize + dx;
            let y = node.grid_y as isize + dy;
            if x < 0 || y < 0 {
                continue;
            }
            if let Some(neighbour) = self.id_at(x as usize, y as usize) {
                out.ids[out.len] = neighbour;
                out.len += 1;
            }
        }
        out
    }

    /// Box-blur the penalty field with a `(2 * radius + 1)` square kernel.
    ///
    /// Runs as two sliding-window passes (rows, then columns) so the cost is
    /// linear in the node count regardless of radius. Samples past the
    /// border repeat the edge value instead of reading as zero.
    ///
    /// Fails with [`GridError::InvalidBlurRadius`] when the kernel area
    /// overflows; the penalties are left untouched in that case.
    pub fn blur_penalties(&mut self, radius: usize) -> Result<()> {
        if radius > 0 {
            let area = radius
                .checked_mul(2)
                .and_then(|span| span.checked_add(1))
                .and_then(|span| span.checked_mul(span))
                .ok_or(GridError::InvalidBlurRadius(radius))? as u128;
            let (width, height) = (self.size_x, self.size_y);

            let mut horizontal = vec![0u128; width * height];
            for y in 0..height {
                let row = y * width;
                let penalty = |x: usize| self.nodes[row + x].terrain_penalty as u128;

                let mut sum = replicated_window(penalty, radius, width);
                horizontal[row] = sum;
                for x in 1..width {
                    let (leaving, entering) = window_edges(x, radius, width);
                    sum = sum - penalty(leaving) + penalty(entering);
                    horizontal[row + x] = sum;
                }
            }

            for x in 0..width {
                let column = |y: usize| horizontal[y * width + x];

                let mut sum = replicated_window(column, radius, height);
                self.nodes[x].terrain_penalty = rounded_mean(sum, area);
                for y in 1..height {
                    let (leaving, entering) = window_edges(y, radius, height);
                    sum = sum - column(leaving) + column(entering);
                    self.nodes[y * width + x].terrain_penalty = rounded_mean(sum, area);
                }
            }
        }

        let penalties = self.nodes.iter().map(|node| node.terrain_penalty);
        self.penalty_min = penalties.clone().min().unwrap_or(0);
        self.penalty_max = penalties.max().unwrap_or(0);
        Ok(())
    }

    /// Zero every node's search epoch. Used when the epoch counter wraps.
    pub(crate) fn reset_search_epochs(&mut self) {
        for node in &mut self.nodes {
            node.reset_epoch();
        }
    }
}

/// Sum of the window centred on index 0, with every out-of-range index
/// replaced by the nearest edge value.
///
/// Index 0 covers `-radius..=0`, the last index covers everything past the
/// far edge, and the cost is bounded by `len` rather than `radius`.
fn replicated_window<F>(value: F, radius: usize, len: usize) -> u128
where
    F: Fn(usize) -> u128,
{
    let last = len - 1;
    let inner: u128 = (1..=radius.min(last)).map(&value).sum();
    (radius as u128 + 1) * value(0) + inner + radius.saturating_sub(last) as u128 * value(last)
}

/// Indices leaving and entering the window as it slides onto `index`.
fn window_edges(index: usize, radius: usize, len: usize) -> (usize, usize) {
    let leaving = index.saturating_sub(radius.saturating_add(1));
    let entering = index.saturating_add(radius).min(len - 1);
    (leaving, entering)
}

fn rounded_mean(sum: u128, area: u128) -> u32 {
    ((sum + area / 2) / area).min(u32::MAX as u128) as u32
}
