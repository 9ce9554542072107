//! Error types for solver operations.

use crate::minimize::ConfigError;
use lion_core::LionError;
use thiserror::Error;

/// Errors that can occur while minimizing or integrating.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    /// The system under integration could not be evaluated at a trial point.
    #[error("Evaluation failed: {what}")]
    Evaluation { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Minimizer config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] LionError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for LionError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { what: _ } => LionError::InvalidArg {
                what: "problem setup",
            },
            SolverError::ConvergenceFailed { what: _ } => LionError::InvalidArg {
                what: "convergence",
            },
            SolverError::Evaluation { what: _ } => LionError::InvalidArg { what: "evaluation" },
            SolverError::Numeric { what: _ } => LionError::InvalidArg { what: "numeric" },
            SolverError::Config(_) => LionError::InvalidArg { what: "minimizer config" },
            SolverError::Core(e) => e,
        }
    }
}
