//! Dynamic programming over grid MDPs.
//!
//! - [`PolicyEvaluation`]: Bellman-expectation sweeps for a fixed policy
//! - [`ValueIteration`]: Bellman-optimality sweeps
//! - [`GreedyPolicy`]: greedy, tie-stable policy extraction from a value grid
//!
//! All solvers read the previous sweep's values and write a fresh array, so
//! the order in which states are visited never changes the result.

pub mod policy;
pub mod policy_evaluation;
pub mod value_iteration;


pub use policy::GreedyPolicy;
pub use policy_evaluation::{EvaluationMode, PolicyEvaluation};
pub use value_iteration::ValueIteration;

use crate::error::{Error, Result};
use crate::grid::{ActionModel, Direction, ValueGrid};

/// Discount factor conventionally used for policy evaluation.
pub const DEFAULT_EVALUATION_DISCOUNT: f64 = 1.0;

/// Discount factor conventionally used for value iteration.
pub const DEFAULT_ITERATION_DISCOUNT: f64 = 0.9;

/// Stopping rule for the convergence loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceConfig {
    /// Maximum number of sweeps
    pub max_iterations: usize,
    /// Stop once the largest per-state change falls below this
    pub threshold: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            threshold: 1e-3,
        }
    }
}

/// Outcome of a convergence loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceReport {
    /// Sweeps performed, never more than `max_iterations`
    pub iterations: usize,
    /// Largest per-state change in the final sweep
    pub delta: f64,
    /// Whether `delta` dropped below the threshold
    pub converged: bool,
}

impl ConvergenceReport {
    fn start() -> Self {
        Self {
            iterations: 0,
            delta: f64::INFINITY,
            converged: false,
        }
    }
}

pub(crate) fn check_discount_factor(discount_factor: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&discount_factor) {
        Ok(discount_factor)
    } else {
        Err(Error::InvalidDiscountFactor(discount_factor))
    }
}

pub(crate) fn check_shape(expected: (usize, usize), found: &[usize]) -> Result<()> {
    match found {
        [rows, cols] if (*rows, *cols) == expected => Ok(()),
        _ => Err(Error::ShapeMismatch {
            expected,
            found: (
                found.first().copied().unwrap_or(0),
                found.get(1).copied().unwrap_or(0),
            ),
        }),
    }
}

/// Value of `(x, y)`; zero for anything off the grid.
pub(crate) fn lookup(values: &ValueGrid, x: usize, y: usize) -> f64 {
    values.get((y, x)).copied().unwrap_or(0.0)
}

/// Largest absolute element-wise difference of two equally shaped grids.
pub(crate) fn max_abs_diff(a: &ValueGrid, b: &ValueGrid) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// `r(s') + γ·V(s')` for the move `direction` out of `(x, y)`.
pub(crate) fn backup<M: ActionModel + ?Sized>(
    model: &M,
    values: &ValueGrid,
    discount_factor: f64,
    x: usize,
    y: usize,
    direction: Direction,
) -> f64 {
    match model.next_state(x, y, direction) {
        Some((nx, ny)) => model.action_reward(nx, ny) + discount_factor * lookup(values, nx, ny),
        None => 0.0,
    }
}

/// Expected return of choosing `intended` in `(x, y)` when the move may slip.
///
/// The intended move is executed with the state's transition probability and
/// the remaining mass is shared evenly by the other physically available moves.
pub(crate) fn weighted_action_value<M: ActionModel + ?Sized>(
    model: &M,
    values: &ValueGrid,
    discount_factor: f64,
    x: usize,
    y: usize,
    intended: Direction,
) -> f64 {
    let physical = model.available_actions(x, y, None);
    let alternatives = physical.bits().count_ones().saturating_sub(1);
    let p = model.transition_probability(x, y);
    let slip = if alternatives == 0 {
        0.0
    } else {
        (1.0 - p) / f64::from(alternatives)
    };

    physical
        .compass()
        .map(|d| {
            let prob = if d == intended { p } else { slip };
            prob * backup(model, values, discount_factor, x, y, d)
        })
        .sum()
}
