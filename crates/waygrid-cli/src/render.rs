//! ASCII rendering of a grid with a planned route on top.

use waygrid_core::{Grid, WorldPoint};

/// Draw `grid` north-up, one character per node.
///
/// `#` blocked, `.` open, `:` open with an above-average penalty,
/// `o` on the route, `*` a waypoint, `S` start and `G` goal.
pub fn render_route(grid: &Grid, start: WorldPoint, waypoints: &[WorldPoint]) -> String {
    let (width, height) = (grid.size_x(), grid.size_y());
    let (low, high) = grid.penalty_range();
    let heavy = low + (high - low) / 2;

    let mut canvas: Vec<Vec<char>> = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    let node = &grid.nodes()[y * width + x];
                    if !node.walkable {
                        '#'
                    } else if high > low && node.terrain_penalty > heavy {
                        ':'
                    } else {
                        '.'
                    }
                })
                .collect()
        })
        .collect();

    let stops: Vec<(usize, usize)> = std::iter::once(start)
        .chain(waypoints.iter().copied())
        .map(|point| grid.node(grid.node_at(point)).coord())
        .collect();

    for leg in stops.windows(2) {
        let (from, to) = (leg[0], leg[1]);
        let steps = from.0.abs_diff(to.0).max(from.1.abs_diff(to.1));
        for step in 1..steps {
            let t = step as f64 / steps as f64;
            let x = from.0 as f64 + (to.0 as f64 - from.0 as f64) * t;
            let y = from.1 as f64 + (to.1 as f64 - from.1 as f64) * t;
            canvas[y.round() as usize][x.round() as usize] = 'o';
        }
    }
    for &(x, y) in stops.iter().skip(1) {
        canvas[y][x] = '*';
    }
    if let Some(&(x, y)) = stops.last().filter(|_| stops.len() > 1) {
        canvas[y][x] = 'G';
    }
    let (x, y) = stops[0];
    canvas[y][x] = 'S';

    let mut out = String::with_capacity((width + 1) * height);
    for row in canvas.iter().rev() {
        out.extend(row.iter());
        out.push('\n');
    }
    out
}
