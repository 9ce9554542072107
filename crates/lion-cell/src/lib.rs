//! lion-cell: electro-thermal model of a single lithium-ion cell.
//!
//! Closed-form relations for the open-circuit voltage, internal resistance,
//! entropic heat and usable capacity, the power-to-current solve, and the
//! right-hand side of the two-state `(soc, T)` model with its analytical
//! Jacobian. All functions are deterministic in the state and parameters and
//! allocation free.
//!
//! # Example
//!
//! ```
//! use lion_cell::{CellParams, Operating, evaluate};
//! use lion_solver::{MinimizeConfig, Minimizer, MinimizerKind};
//!
//! let params = CellParams::generic();
//! let minimizer = Minimizer::new(MinimizerKind::Brent, MinimizeConfig::default());
//! let operating = Operating {
//!     power: 5.0,
//!     ambient_temperature: 298.15,
//!     soh: 1.0,
//!     current_guess: 0.0,
//! };
//!
//! let eval = evaluate(&params, &minimizer, &operating, 0.8, 298.15).unwrap();
//! assert!(eval.current > 0.0);
//! assert!(eval.dsoc_dt < 0.0);
//! ```

pub mod capacity;
pub mod current;
pub mod degradation;
pub mod derivative;
pub mod error;
pub mod ocv;
pub mod params;
pub mod resistance;
pub mod thermal;

// Re-exports
pub use current::{
    current_gradient_wrt_ocv, current_gradient_wrt_resistance, max_power, resolve_current,
};
pub use derivative::{Evaluation, Operating, evaluate};
pub use error::{CellError, CellResult};
pub use ocv::{voltage_ocv, voltage_ocv_gradient};
pub use params::CellParams;
