//! waygrid CLI - command line tools for the waygrid path service.
//!
//! This crate provides the CLI binaries:
//! - plan_path: plan and draw a single route on a map
//! - request_stress: push random requests through the coordinator

pub mod render;
pub mod scenarios;

pub use render::render_route;
pub use scenarios::{corner_requests, random_requests, seeded_requests, RouteRequest};

use waygrid_core::WorldPoint;

/// Parse an `x,y` pair for command line flags.
pub fn parse_point(raw: &str) -> Result<WorldPoint, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {raw:?}"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("bad x in {raw:?}: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("bad y in {raw:?}: {e}"))?;
    Ok(WorldPoint::new(x, y))
}
