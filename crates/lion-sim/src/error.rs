//! Error types for simulation operations.

use lion_cell::CellError;
use lion_solver::SolverError;
use thiserror::Error;

/// Errors encountered while setting up or stepping a simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    /// Invalid or inconsistent setup, reported before any numerical work.
    #[error("Configuration error: {what}")]
    Config { what: String },

    /// The simulation has released its integrator and minimizer.
    #[error("Resource unavailable: {what}")]
    Resource { what: &'static str },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    #[error("Invalid input: {what}")]
    InvalidInput { what: &'static str },

    /// A lifecycle hook reported a failure.
    #[error("Hook failed: {what}")]
    Hook { what: String },

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    /// Whether the caller may retry the same step, possibly with other
    /// inputs, after this error. The committed state is untouched in that
    /// case.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimError::ConvergenceFailed { .. }
            | SimError::NonPhysical { .. }
            | SimError::InvalidInput { .. } => true,
            SimError::Cell(e) => !matches!(e, CellError::InvalidParameter { .. }),
            SimError::Solver(e) => matches!(
                e,
                SolverError::ConvergenceFailed { .. }
                    | SolverError::Evaluation { .. }
                    | SolverError::Numeric { .. }
            ),
            SimError::Config { .. } | SimError::Resource { .. } | SimError::Hook { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SimError::Resource {
            what: "integrator released",
        };
        assert!(err.to_string().contains("integrator released"));

        let err: SimError = CellError::NonPhysical { what: "soc" }.into();
        assert_eq!(err.to_string(), "Non-physical value: soc");
    }

    #[test]
    fn recoverability() {
        assert!(
            SimError::ConvergenceFailed {
                what: String::new()
            }
            .is_recoverable()
        );
        assert!(SimError::from(CellError::PowerLimit { power: 1.0, max: 0.5 }).is_recoverable());
        assert!(
            !SimError::from(CellError::InvalidParameter { what: "cp" }).is_recoverable()
        );
        assert!(
            !SimError::Config {
                what: String::new()
            }
            .is_recoverable()
        );
        assert!(
            !SimError::from(SolverError::ProblemSetup {
                what: String::new()
            })
            .is_recoverable()
        );
    }
}
