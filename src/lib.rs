pub mod dynamic;
pub mod error;
pub mod grid;

pub use dynamic::{
    ConvergenceConfig, ConvergenceReport, EvaluationMode, GreedyPolicy, PolicyEvaluation,
    ValueIteration,
};
pub use error::{Error, Result};
pub use grid::{ActionModel, Direction, GridLevel, GridParameters, Maze, Policy, ValueGrid};
