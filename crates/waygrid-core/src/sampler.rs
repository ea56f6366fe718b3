//! The world-classification capability consumed by grid construction.

use crate::models::{Sample, WorldPoint};

/// Classifies world points as walkable or blocked, with a terrain penalty.
///
/// Implementations must be deterministic for a static world so repeated
/// grid builds are identical.
pub trait CostSampler {
    fn classify(&self, point: WorldPoint) -> Sample;
}

impl<F> CostSampler for F
where
    F: Fn(WorldPoint) -> Sample,
{
    fn classify(&self, point: WorldPoint) -> Sample {
        self(point)
    }
}

/// Sampler for an obstacle-free world with uniform terrain.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGround {
    pub penalty: u32,
}

impl CostSampler for OpenGround {
    fn classify(&self, _point: WorldPoint) -> Sample {
        Sample::open(self.penalty)
    }
}
