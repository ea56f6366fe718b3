pub mod error;
pub mod grid;
pub mod heap;
pub mod models;
pub mod pathfinder;
pub mod rules;
pub mod sampler;
pub mod spatial;

pub use error::GridError;
pub use grid::{Grid, Neighbours, Node, NodeId, INFINITE_COST};
pub use heap::{HeapArena, IndexedHeap, NOT_IN_HEAP};
pub use models::{FailureReason, PathResult, Sample, WorldPoint};
pub use pathfinder::Pathfinder;
pub use rules::GridConfig;
pub use sampler::{CostSampler, OpenGround};
pub use spatial::{octile_distance, step_cost, DIAGONAL_STEP_COST, ORTHOGONAL_STEP_COST};
