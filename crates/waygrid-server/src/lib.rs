//! Path request service: a serialized coordinator in front of the A* engine,
//! the text-map world it searches, and the JSON line protocol.

pub mod config;
pub mod coordinator;
pub mod service;
pub mod terrain;

pub use config::Config;
pub use coordinator::{
    CoordinatorConfig, CoordinatorError, CoordinatorStats, PathCoordinator, PathTicket, RequestId,
};
pub use service::{serve, ServeSummary, WireRequest, WireResponse};
pub use terrain::{MapError, TerrainMap};
