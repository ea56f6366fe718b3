//! Grid-space distance metric.
//!
//! Costs are integers scaled by 10 so diagonal steps (√2 ≈ 1.4) stay exact
//! across long searches.

/// Cost of an orthogonal step between adjacent nodes.
pub const ORTHOGONAL_STEP_COST: u32 = 10;
/// Cost of a diagonal step between adjacent nodes.
pub const DIAGONAL_STEP_COST: u32 = 14;

/// Octile distance between two grid coordinates.
///
/// Exact for 8-connected movement with 10/14 step costs, so it is both
/// admissible and consistent as an A* heuristic.
pub fn octile_distance(a: (usize, usize), b: (usize, usize)) -> u32 {
    let dx = a.0.abs_diff(b.0) as u32;
    let dy = a.1.abs_diff(b.1) as u32;
    let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
    DIAGONAL_STEP_COST * short + ORTHOGONAL_STEP_COST * (long - short)
}

/// Movement cost between two adjacent grid coordinates.
pub fn step_cost(a: (usize, usize), b: (usize, usize)) -> u32 {
    if a.0 != b.0 && a.1 != b.1 {
        DIAGONAL_STEP_COST
    } else {
        ORTHOGONAL_STEP_COST
    }
}
