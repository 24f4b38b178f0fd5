//! Error types shared by the grid model and the dynamic-programming solvers.

use thiserror::Error;

use crate::grid::Direction;

/// Errors raised while building a grid level or running a solver on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A grid or maze was requested with a zero dimension.
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    /// A coordinate lies outside the grid.
    #[error("cell ({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    /// The discount factor must be in `[0, 1]`.
    #[error("discount factor must lie in [0, 1], got {0}")]
    InvalidDiscountFactor(f64),

    /// A probability must be in `[0, 1]`.
    #[error("transition probability must lie in [0, 1], got {0}")]
    InvalidProbability(f64),

    /// A value or policy array does not match the `(height, width)` of the grid.
    #[error("expected an array of shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Probability-weighted evaluation found a state where the policy does not
    /// select exactly one available direction.
    #[error("policy at ({x}, {y}) must select exactly one available direction, found {actions}")]
    AmbiguousPolicy {
        x: usize,
        y: usize,
        actions: Direction,
    },

    /// Probability-weighted evaluation was run without a policy.
    #[error("probability-weighted evaluation requires a policy")]
    MissingPolicy,
}

/// Result type for grid and solver operations
pub type Result<T> = std::result::Result<T, Error>;
