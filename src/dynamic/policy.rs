//! Greedy policy extraction from a value grid.
//!
//! In each state the greedy policy keeps every move whose neighbour has the
//! highest value, so ties show up as several direction bits. [`update_policy`]
//! resolves such ties by falling back to whatever the previous policy held in
//! that state, which keeps repeated extractions from flip-flopping.
//!
//! [`update_policy`]: GreedyPolicy::update_policy

use log::debug;
use ndarray::Array2;

use crate::dynamic::{check_shape, lookup};
use crate::error::Result;
use crate::grid::{ActionModel, Direction, Policy, ValueGrid};

/// A directional policy over a grid, refined from value grids.
///
/// # Examples
/// ```
/// use gridmdp::dynamic::GreedyPolicy;
/// use gridmdp::grid::{Direction, GridLevel, GridParameters};
/// use ndarray::array;
///
/// let level = GridLevel::new(GridParameters::default()).unwrap();
/// let values = array![[-4.0, -3.0, -2.0], [-3.0, -2.0, -1.0], [-2.0, -1.0, 0.0]];
/// let mut policy = GreedyPolicy::new(&level);
/// let greedy = policy.calculate_greedy_directions(&values).unwrap();
/// assert_eq!(greedy[[0, 0]], Direction::EAST | Direction::SOUTH);
/// assert_eq!(greedy[[0, 2]], Direction::SOUTH);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyPolicy<'a, M: ActionModel> {
    model: &'a M,
    directions: Policy,
}

impl<'a, M: ActionModel> GreedyPolicy<'a, M> {
    /// Starts from an empty policy (`STAY` everywhere).
    pub fn new(model: &'a M) -> Self {
        Self {
            model,
            directions: Array2::from_elem(model.shape(), Direction::STAY),
        }
    }

    pub fn set_policy(&mut self, directions: Policy) -> Result<()> {
        check_shape(self.model.shape(), directions.shape())?;
        self.directions = directions;
        Ok(())
    }

    pub fn policy(&self) -> &Policy {
        &self.directions
    }

    /// Replaces the policy with the raw greedy directions, ties included.
    pub fn get_directions(&mut self, values: &ValueGrid) -> Result<&Policy> {
        self.directions = self.calculate_greedy_directions(values)?;
        Ok(&self.directions)
    }

    /// Replaces the policy with the greedy directions, keeping the previous
    /// entry wherever the greedy result is not a single direction.
    pub fn update_policy(&mut self, values: &ValueGrid) -> Result<&Policy> {
        let mut greedy = self.calculate_greedy_directions(values)?;
        let mut kept = 0;
        for (new, old) in greedy.iter_mut().zip(self.directions.iter()) {
            if !new.is_single() {
                *new = *old;
                kept += 1;
            }
        }
        debug!("policy update kept {} previous entries", kept);
        self.directions = greedy;
        Ok(&self.directions)
    }

    /// Greedy directions for every non-terminal state of `values`.
    pub fn calculate_greedy_directions(&self, values: &ValueGrid) -> Result<Policy> {
        let shape = self.model.shape();
        check_shape(shape, values.shape())?;
        let mut directions = Array2::from_elem(shape, Direction::STAY);
        for ((y, x), entry) in directions.indexed_iter_mut() {
            if !self.model.is_terminal(x, y) {
                *entry = self.cell_directions(values, x, y);
            }
        }
        Ok(directions)
    }

    fn cell_directions(&self, values: &ValueGrid, x: usize, y: usize) -> Direction {
        let mut best = Direction::STAY;
        let mut best_value = f64::NEG_INFINITY;
        for d in self.model.available_actions(x, y, None).compass() {
            let value = match self.model.next_state(x, y, d) {
                Some((nx, ny)) => lookup(values, nx, ny),
                None => continue,
            };
            if value > best_value {
                best = d;
                best_value = value;
            } else if value == best_value {
                best |= d;
            }
        }
        best
    }

    /// Physically available moves in `(x, y)`; none at the exit.
    pub fn get_allowed_actions(&self, x: usize, y: usize) -> Vec<Direction> {
        self.model.allowed_actions(x, y)
    }

    /// Cells visited by following the policy from `start`, taking the first
    /// permitted direction (North, East, South, West) in each state. Stops at
    /// the exit, at a state with no permitted move, or after `max_steps` moves.
    pub fn trajectory(&self, start: (usize, usize), max_steps: usize) -> Vec<(usize, usize)> {
        let mut path = vec![start];
        let mut pos = start;
        for _ in 0..max_steps {
            if self.model.is_terminal(pos.0, pos.1) {
                break;
            }
            let permitted = self
                .model
                .available_actions(pos.0, pos.1, Some(&self.directions));
            let Some(next) = permitted
                .compass()
                .next()
                .and_then(|d| self.model.next_state(pos.0, pos.1, d))
            else {
                break;
            };
            pos = next;
            path.push(pos);
        }
        path
    }
}
