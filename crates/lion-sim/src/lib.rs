//! Electro-thermal simulation of a lithium-ion cell.
//!
//! Provides:
//! - [`Simulation`]: lifecycle (`init`, `reset`, `step`, `run`, `cleanup`)
//!   around an adaptive integrator and the cell model
//! - split state: integrated pair, derived quantities, degradation counters
//! - pluggable cycle detection and lifecycle hooks
//! - a parallel batch runner for independent cases
//!
//! # Example
//!
//! ```
//! use lion_cell::CellParams;
//! use lion_sim::{SimConfig, Simulation};
//!
//! let params = CellParams::generic();
//! let config = SimConfig {
//!     time_seconds: 10.0,
//!     ..SimConfig::default()
//! };
//!
//! let mut sim = Simulation::new(config, &params).unwrap();
//! sim.init().unwrap();
//! let summary = sim.run(&[2.0; 10], &[298.15; 10]).unwrap();
//! assert_eq!(summary.steps, 10);
//! assert!(sim.should_close());
//! ```

pub mod batch;
pub mod config;
pub mod cycle;
pub mod error;
pub mod hooks;
pub mod sim;
pub mod state;
pub mod system;

// Re-exports for public API
pub use batch::{BatchCase, BatchOutcome, run_batch};
pub use config::{CycleConfig, JacobianMethod, LogConfig, LogLevel, Regime, SimConfig};
pub use cycle::{CyclePolicy, EquivalentFullCycle, SocSwing};
pub use error::{SimError, SimResult};
pub use hooks::{NoHooks, Recorder, SimHooks};
pub use sim::{RunSummary, Simulation};
pub use state::{DegradationState, DerivedState, Inputs, IntegratedState, SimState};
pub use system::SolverInputs;
