//! Error types for cell model evaluation.

use lion_core::LionError;
use lion_solver::SolverError;
use thiserror::Error;

/// Errors that can occur while evaluating the cell model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: &'static str },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    /// The requested power exceeds what the cell can deliver at its present
    /// open-circuit voltage and resistance.
    #[error("Power {power} W exceeds the deliverable maximum {max} W")]
    PowerLimit { power: f64, max: f64 },

    #[error("Current solve failed: {0}")]
    Current(#[from] SolverError),
}

pub type CellResult<T> = Result<T, CellError>;

impl From<CellError> for LionError {
    fn from(e: CellError) -> Self {
        match e {
            CellError::InvalidParameter { what } => LionError::InvalidArg { what },
            CellError::NonPhysical { what } => LionError::InvalidArg { what },
            CellError::PowerLimit { power, max } => LionError::OutOfRange {
                what: "power",
                value: power,
                min: f64::NEG_INFINITY,
                max,
            },
            CellError::Current(e) => e.into(),
        }
    }
}

/// Ensure a value is finite, reporting it as non-physical otherwise.
pub(crate) fn check_finite(value: f64, what: &'static str) -> CellResult<f64> {
    lion_core::ensure_finite(value, what).map_err(|_| CellError::NonPhysical { what })
}
