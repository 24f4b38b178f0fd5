//! Value iteration on a grid MDP.
//!
//! Every sweep replaces the value of each non-terminal state with its best
//! action value, where an action value is the transition-probability weighted
//! return of the move (see [`crate::dynamic`]). An optional policy limits
//! which moves are candidates for the maximum; the slip outcomes of a move
//! still range over every physically available move.
//!
//! # Examples
//! ```
//! use gridmdp::dynamic::{ValueIteration, DEFAULT_ITERATION_DISCOUNT};
//! use gridmdp::grid::{GridLevel, GridParameters};
//!
//! let level = GridLevel::new(GridParameters::default()).unwrap();
//! let mut solver = ValueIteration::new(&level, DEFAULT_ITERATION_DISCOUNT).unwrap();
//! let iterations = solver.run_to_convergence(100, 1e-3);
//! assert!(iterations < 100);
//! assert!((solver.state_value(1, 2) + 1.0).abs() < 1e-9);
//! ```

use log::{debug, trace, warn};
use ndarray::Array2;

use crate::dynamic::{
    check_discount_factor, check_shape, lookup, max_abs_diff, weighted_action_value,
    ConvergenceConfig, ConvergenceReport,
};
use crate::error::Result;
use crate::grid::{ActionModel, Policy, ValueGrid};

/// Computes optimal state values by repeated Bellman-optimality sweeps.
#[derive(Debug, Clone)]
pub struct ValueIteration<'a, M: ActionModel> {
    model: &'a M,
    values: ValueGrid,
    discount_factor: f64,
    policy: Option<Policy>,
}

impl<'a, M: ActionModel> ValueIteration<'a, M> {
    pub fn new(model: &'a M, discount_factor: f64) -> Result<Self> {
        Ok(Self {
            model,
            values: Array2::zeros(model.shape()),
            discount_factor: check_discount_factor(discount_factor)?,
            policy: None,
        })
    }

    pub fn reset(&mut self) {
        self.values = Array2::zeros(self.model.shape());
    }

    /// Restricts the moves each state maximises over.
    pub fn set_policy(&mut self, policy: Option<Policy>) -> Result<()> {
        if let Some(policy) = &policy {
            check_shape(self.model.shape(), policy.shape())?;
        }
        self.policy = policy;
        Ok(())
    }

    pub fn set_discount_factor(&mut self, discount_factor: f64) -> Result<()> {
        self.discount_factor = check_discount_factor(discount_factor)?;
        Ok(())
    }

    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn values(&self) -> &ValueGrid {
        &self.values
    }

    /// Current value of `(x, y)`; zero off the grid.
    pub fn state_value(&self, x: usize, y: usize) -> f64 {
        lookup(&self.values, x, y)
    }

    /// Largest action value in `(x, y)`, or zero when no move is possible.
    fn max_action_value(&self, x: usize, y: usize) -> f64 {
        let actions = self.model.available_actions(x, y, self.policy.as_ref());
        if actions.is_empty() {
            return 0.0;
        }
        actions
            .compass()
            .map(|d| {
                weighted_action_value(self.model, &self.values, self.discount_factor, x, y, d)
            })
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Runs one sweep and returns the largest change of any state value.
    pub fn state_sweep(&mut self) -> f64 {
        let (width, height) = self.model.dimensions();
        let mut swept = Array2::zeros((height, width));
        for y in 0..height {
            for x in 0..width {
                if !self.model.is_terminal(x, y) {
                    swept[[y, x]] = self.max_action_value(x, y);
                }
            }
        }
        let delta = max_abs_diff(&swept, &self.values);
        self.values = swept;
        delta
    }

    /// Sweeps until the largest change is below `threshold` or
    /// `max_iterations` sweeps have run. Returns the number of sweeps.
    pub fn run_to_convergence(&mut self, max_iterations: usize, threshold: f64) -> usize {
        self.converge(&ConvergenceConfig {
            max_iterations,
            threshold,
        })
        .iterations
    }

    pub fn converge(&mut self, config: &ConvergenceConfig) -> ConvergenceReport {
        let mut report = ConvergenceReport::start();
        for _ in 0..config.max_iterations {
            report.delta = self.state_sweep();
            report.iterations += 1;
            trace!(
                "value iteration sweep {}: delta {}",
                report.iterations,
                report.delta
            );
            if report.delta < config.threshold {
                report.converged = true;
                break;
            }
        }

        if report.converged {
            debug!(
                "value iteration converged after {} sweeps (delta {})",
                report.iterations, report.delta
            );
        } else {
            warn!(
                "value iteration stopped at {} sweeps without converging (delta {})",
                report.iterations, report.delta
            );
        }
        report
    }
}
