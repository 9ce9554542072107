//! Numerical collaborators for the lion cell simulator.
//!
//! This crate provides the two numerical building blocks the electro-thermal
//! model leans on:
//! - bracketing scalar minimizers (golden-section, Brent, quad-golden), used
//!   to resolve the cell current from a power request
//! - an adaptive ODE driver for two-state systems with explicit, implicit,
//!   extrapolation and multistep steppers
//!
//! Newton iteration and central-difference Jacobians support the implicit
//! steppers and the numerical Jacobian strategy.

pub mod error;
pub mod jacobian;
pub mod minimize;
pub mod newton;
pub mod ode;

pub use error::{SolverError, SolverResult};
pub use minimize::{MinimizeConfig, Minimizer, MinimizerKind, Minimum};
pub use newton::{NewtonConfig, NewtonResult};
pub use ode::{Driver, DriverConfig, DriverStats, Jacobian, OdeSystem, StepperKind};
