//! Independent runs in parallel.
//!
//! Each case gets its own [`Simulation`]; the cell parameters are shared
//! read-only across worker threads.

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::hooks::Recorder;
use crate::sim::{RunSummary, Simulation};
use crate::state::SimState;
use lion_cell::CellParams;
use lion_solver::DriverStats;
use rayon::prelude::*;
use tracing::info_span;

/// Input traces for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchCase {
    pub name: String,
    pub power: Vec<f64>,
    pub ambient_temperature: Vec<f64>,
}

impl BatchCase {
    /// Constant power and ambient temperature for `samples` steps.
    pub fn constant(name: impl Into<String>, power: f64, ambient: f64, samples: usize) -> Self {
        Self {
            name: name.into(),
            power: vec![power; samples],
            ambient_temperature: vec![ambient; samples],
        }
    }
}

/// Recorded result of one case.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub name: String,
    pub summary: RunSummary,
    pub initial: SimState,
    pub states: Vec<SimState>,
    pub stats: Option<DriverStats>,
}

/// Run every case with the same configuration and parameters.
///
/// Results come back in input order; one failing case does not stop the
/// others.
pub fn run_batch(
    config: &SimConfig,
    params: &CellParams,
    cases: &[BatchCase],
) -> Vec<SimResult<BatchOutcome>> {
    cases
        .par_iter()
        .map(|case| run_case(config, params, case))
        .collect()
}

fn run_case(config: &SimConfig, params: &CellParams, case: &BatchCase) -> SimResult<BatchOutcome> {
    let _span = info_span!("case", name = %case.name).entered();

    let recorder = Recorder::with_capacity(case.power.len().min(config.max_iters()));
    let mut sim = Simulation::with_hooks(config.clone(), params, recorder)?;
    sim.init()?;
    let initial = *sim.state();
    let summary = sim.run(&case.power, &case.ambient_temperature)?;
    let stats = sim.driver_stats();
    sim.cleanup()?;

    let recorder = sim.into_hooks();
    Ok(BatchOutcome {
        name: case.name.clone(),
        summary,
        initial,
        stats,
        states: recorder.into_states(),
    })
}
