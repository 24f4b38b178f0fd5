//! Iterative policy evaluation.
//!
//! Each sweep applies the Bellman expectation backup to every non-terminal
//! state, reading the values from the previous sweep (`start_values`) and
//! writing a fresh array (`end_values`).
//!
//! Two backups are offered:
//!
//! - [`EvaluationMode::Uniform`]: the value of a state is the mean of
//!   `r(s') + γ·V(s')` over the moves currently available there, i.e. every
//!   move the policy allows (all moves without a policy) is equally likely.
//! - [`EvaluationMode::Weighted`]: the policy must pick exactly one move per
//!   state. That move is executed with the level's transition probability and
//!   the rest of the probability mass is spread over the other physically
//!   available moves.
//!
//! # Examples
//! ```
//! use gridmdp::dynamic::{PolicyEvaluation, DEFAULT_EVALUATION_DISCOUNT};
//! use gridmdp::grid::{GridLevel, GridParameters};
//!
//! let level = GridLevel::new(GridParameters::default()).unwrap();
//! let mut evaluation = PolicyEvaluation::new(&level, DEFAULT_EVALUATION_DISCOUNT).unwrap();
//! let iterations = evaluation.run_to_convergence(1000, 1e-9).unwrap();
//! assert!(iterations < 1000);
//! assert!((evaluation.state_value(0, 0) + 18.0).abs() < 1e-6);
//! ```

use std::mem;

use log::{debug, trace, warn};
use ndarray::Array2;

use crate::dynamic::{
    backup, check_discount_factor, check_shape, max_abs_diff, weighted_action_value,
    ConvergenceConfig, ConvergenceReport,
};
use crate::error::{Error, Result};
use crate::grid::{ActionModel, Direction, Policy, ValueGrid};

/// How a state's value is formed from its moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// Mean over all currently available moves.
    #[default]
    Uniform,
    /// Transition-probability weighted sum for a single policy move.
    Weighted,
}

/// Evaluates a fixed policy on a grid.
#[derive(Debug, Clone)]
pub struct PolicyEvaluation<'a, M: ActionModel> {
    model: &'a M,
    start_values: ValueGrid,
    end_values: ValueGrid,
    iterations: usize,
    policy: Option<Policy>,
    discount_factor: f64,
    mode: EvaluationMode,
}

impl<'a, M: ActionModel> PolicyEvaluation<'a, M> {
    pub fn new(model: &'a M, discount_factor: f64) -> Result<Self> {
        let shape = model.shape();
        Ok(Self {
            model,
            start_values: Array2::zeros(shape),
            end_values: Array2::zeros(shape),
            iterations: 0,
            policy: None,
            discount_factor: check_discount_factor(discount_factor)?,
            mode: EvaluationMode::default(),
        })
    }

    /// Clears both value arrays and the iteration count.
    pub fn reset(&mut self) {
        let shape = self.model.shape();
        self.start_values = Array2::zeros(shape);
        self.end_values = Array2::zeros(shape);
        self.iterations = 0;
    }

    /// Sets the policy to evaluate. Accumulated values are kept as the starting
    /// point but the iteration count starts over.
    pub fn set_policy(&mut self, policy: Option<Policy>) -> Result<()> {
        if let Some(policy) = &policy {
            check_shape(self.model.shape(), policy.shape())?;
        }
        self.policy = policy;
        self.iterations = 0;
        Ok(())
    }

    pub fn set_discount_factor(&mut self, discount_factor: f64) -> Result<()> {
        self.discount_factor = check_discount_factor(discount_factor)?;
        self.iterations = 0;
        Ok(())
    }

    pub fn set_mode(&mut self, mode: EvaluationMode) {
        self.mode = mode;
    }

    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// Sweeps since the last policy or discount change.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Values at the start of the latest sweep.
    pub fn start_values(&self) -> &ValueGrid {
        &self.start_values
    }

    /// Values produced by the latest sweep.
    pub fn end_values(&self) -> &ValueGrid {
        &self.end_values
    }

    /// Latest value of `(x, y)`; zero off the grid.
    pub fn state_value(&self, x: usize, y: usize) -> f64 {
        crate::dynamic::lookup(&self.end_values, x, y)
    }

    /// Runs one sweep over all states.
    ///
    /// In weighted mode a state whose policy entry does not select exactly one
    /// available move aborts the sweep with [`Error::AmbiguousPolicy`]; the
    /// value arrays are left as they were.
    pub fn do_iteration(&mut self) -> Result<()> {
        let swept = self.sweep(&self.end_values)?;
        self.start_values = mem::replace(&mut self.end_values, swept);
        self.iterations += 1;
        Ok(())
    }

    fn sweep(&self, values: &ValueGrid) -> Result<ValueGrid> {
        let (width, height) = self.model.dimensions();
        let mut swept = Array2::zeros((height, width));
        for y in 0..height {
            for x in 0..width {
                if !self.model.is_terminal(x, y) {
                    swept[[y, x]] = self.cell_value(values, x, y)?;
                }
            }
        }
        Ok(swept)
    }

    fn cell_value(&self, values: &ValueGrid, x: usize, y: usize) -> Result<f64> {
        match self.mode {
            EvaluationMode::Uniform => Ok(self.uniform_value(values, x, y)),
            EvaluationMode::Weighted => self.weighted_value(values, x, y),
        }
    }

    fn uniform_value(&self, values: &ValueGrid, x: usize, y: usize) -> f64 {
        let actions = self.model.available_actions(x, y, self.policy.as_ref());
        if actions.is_empty() {
            return 0.0;
        }
        let total: f64 = actions
            .compass()
            .map(|d| backup(self.model, values, self.discount_factor, x, y, d))
            .sum();
        total / f64::from(actions.bits().count_ones())
    }

    fn weighted_value(&self, values: &ValueGrid, x: usize, y: usize) -> Result<f64> {
        let policy = self.policy.as_ref().ok_or(Error::MissingPolicy)?;
        if self.model.available_actions(x, y, None).is_empty() {
            return Ok(0.0);
        }
        let chosen: Direction = self.model.available_actions(x, y, Some(policy));
        if !chosen.is_single() {
            return Err(Error::AmbiguousPolicy {
                x,
                y,
                actions: chosen,
            });
        }
        Ok(weighted_action_value(
            self.model,
            values,
            self.discount_factor,
            x,
            y,
            chosen,
        ))
    }

    /// Sweeps until the largest per-state change is below `threshold` or
    /// `max_iterations` sweeps have run. Returns the number of sweeps.
    pub fn run_to_convergence(&mut self, max_iterations: usize, threshold: f64) -> Result<usize> {
        let report = self.converge(&ConvergenceConfig {
            max_iterations,
            threshold,
        })?;
        Ok(report.iterations)
    }

    pub fn converge(&mut self, config: &ConvergenceConfig) -> Result<ConvergenceReport> {
        let mut report = ConvergenceReport::start();
        for _ in 0..config.max_iterations {
            self.do_iteration()?;
            report.iterations += 1;
            report.delta = max_abs_diff(&self.end_values, &self.start_values);
            trace!(
                "policy evaluation sweep {}: delta {}",
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
                "policy evaluation converged after {} sweeps (delta {})",
                report.iterations, report.delta
            );
        } else {
            warn!(
                "policy evaluation stopped at {} sweeps without converging (delta {})",
                report.iterations, report.delta
            );
        }
        Ok(report)
    }
}
