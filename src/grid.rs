//! Grid worlds: directions, mazes and the action/transition model.
//!
//! # Action model
//!
//! Both dynamic-programming solvers consume a grid through [`ActionModel`].
//! It answers which moves are legal in a state, where a move leads, how likely
//! the intended move is to be executed and what reward is collected on
//! arrival. [`GridLevel`] is the standard implementation.
//!
//! Arrays are indexed `[[y, x]]` with shape `(height, width)`.

pub mod direction;
pub mod level;
pub mod maze;

pub use direction::Direction;
pub use level::{GridLevel, GridParameters};
pub use maze::{Cell, Maze};

use ndarray::Array2;

/// One [`Direction`] set per state.
pub type Policy = Array2<Direction>;

/// One value per state.
pub type ValueGrid = Array2<f64>;

/// Trait for grid models the solvers can run on
pub trait ActionModel {
    /// `(width, height)` of the grid.
    fn dimensions(&self) -> (usize, usize);

    /// The terminal cell.
    fn end(&self) -> (usize, usize);

    fn is_terminal(&self, x: usize, y: usize) -> bool {
        self.end() == (x, y)
    }

    /// Moves permitted in `(x, y)`, optionally restricted to the directions a
    /// policy selects there. The terminal state never has any.
    fn available_actions(&self, x: usize, y: usize, policy: Option<&Policy>) -> Direction;

    /// The cell reached by taking a single `direction` from `(x, y)`, or `None`
    /// when the move would leave the grid.
    fn next_state(&self, x: usize, y: usize, direction: Direction) -> Option<(usize, usize)>;

    /// Probability that the intended move in `(x, y)` is the one executed.
    fn transition_probability(&self, x: usize, y: usize) -> f64;

    /// Reward collected on arriving at `(x, y)`.
    fn action_reward(&self, x: usize, y: usize) -> f64;

    /// `(height, width)`, the shape of value and policy arrays.
    fn shape(&self) -> (usize, usize) {
        let (width, height) = self.dimensions();
        (height, width)
    }

    /// Physically available moves of `(x, y)` as individual directions; empty
    /// at the terminal state.
    fn allowed_actions(&self, x: usize, y: usize) -> Vec<Direction> {
        self.available_actions(x, y, None).split()
    }
}
