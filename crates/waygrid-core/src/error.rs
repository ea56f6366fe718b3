//! Grid construction errors.

use thiserror::Error;

/// Configuration problems detected while building a [`Grid`](crate::grid::Grid).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("node radius must be positive and finite, got {0}")]
    InvalidNodeRadius(f64),
    #[error("world size must be positive and finite, got {width} x {depth}")]
    InvalidWorldSize { width: f64, depth: f64 },
    #[error("grid resolves to {size_x} x {size_y} nodes; both dimensions must be non-zero")]
    EmptyGrid { size_x: usize, size_y: usize },
    #[error("blur radius {0} is too large; the (2r + 1)^2 kernel area must fit in a usize")]
    InvalidBlurRadius(usize),
}

pub type Result<T> = std::result::Result<T, GridError>;
