//! Simulation driver.
//!
//! A [`Simulation`] owns its integrator and minimizer, borrows the cell
//! parameters, and advances the state one fixed interval per [`step`]. The
//! integrator works on a copy of the integrated pair; nothing is committed
//! until the whole step, bookkeeping included, has succeeded.
//!
//! [`step`]: Simulation::step

use crate::config::SimConfig;
use crate::cycle::{self, CyclePolicy};
use crate::error::{SimError, SimResult};
use crate::hooks::{NoHooks, SimHooks};
use crate::state::{DegradationState, DerivedState, Inputs, IntegratedState, SimState};
use crate::system::SolverInputs;
use lion_cell::degradation::next_soh;
use lion_cell::{CellParams, Operating, evaluate};
use lion_solver::{Driver, DriverStats, Minimizer};
use tracing::{debug, info, trace, warn};

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Committed steps during this call.
    pub steps: usize,
    /// Whether the simulated time reached the configured end.
    pub closed: bool,
}

/// Integrator and minimizer, dropped together by `cleanup`.
struct Resources {
    driver: Driver,
    minimizer: Minimizer,
}

/// One cell driven through time by a fixed-interval power and ambient
/// temperature trace.
///
/// Lifecycle: construct, [`init`](Self::init), then [`step`](Self::step) or
/// [`run`](Self::run) until [`should_close`](Self::should_close), and
/// finally [`cleanup`](Self::cleanup). [`reset`](Self::reset) starts over
/// without reallocating.
pub struct Simulation<'p, H = NoHooks> {
    config: SimConfig,
    params: &'p CellParams,
    hooks: H,
    cycle: Box<dyn CyclePolicy + Send>,
    resources: Option<Resources>,
    state: SimState,
    initialized: bool,
    finished: bool,
}

impl<'p> Simulation<'p, NoHooks> {
    /// Create a simulation without hooks. Call [`Simulation::init`] before
    /// stepping.
    pub fn new(config: SimConfig, params: &'p CellParams) -> SimResult<Self> {
        Self::with_hooks(config, params, NoHooks)
    }
}

impl<'p, H: SimHooks> Simulation<'p, H> {
    /// Validate `config` and `params` and allocate the integrator and
    /// minimizer. The state is zeroed.
    pub fn with_hooks(config: SimConfig, params: &'p CellParams, hooks: H) -> SimResult<Self> {
        config.validate()?;
        params.validate()?;

        let driver = Driver::new(config.stepper, config.driver_config())?;
        let minimizer = Minimizer::new(config.minimizer, config.minimize_config()?);
        debug!(
            name = %config.name,
            stepper = config.stepper.name(),
            minimizer = config.minimizer.name(),
            jacobian = config.jacobian.name(),
            "simulation created"
        );

        Ok(Self {
            cycle: cycle::from_config(&config.cycle),
            config,
            params,
            hooks,
            resources: Some(Resources { driver, minimizer }),
            state: SimState::default(),
            initialized: false,
            finished: false,
        })
    }

    /// Replace the configured cycle policy.
    pub fn with_cycle_policy(mut self, policy: Box<dyn CyclePolicy + Send>) -> Self {
        self.cycle = policy;
        self
    }

    /// Set up the initial state from the cell parameters and call the init
    /// hook.
    ///
    /// # Errors
    ///
    /// [`SimError::Resource`] after `cleanup`; cell-model failures at the
    /// initial state; hook failures.
    pub fn init(&mut self) -> SimResult<()> {
        let res = self.resources.as_ref().ok_or(SimError::Resource {
            what: "simulation was cleaned up",
        })?;

        let init = &self.params.init;
        let inputs = Inputs {
            power: 0.0,
            ambient_temperature: init.internal_temperature,
        };
        let integrated = IntegratedState {
            soc_nominal: init.soc,
            internal_temperature: init.internal_temperature,
        };
        let operating = Operating {
            power: inputs.power,
            ambient_temperature: inputs.ambient_temperature,
            soh: init.soh,
            current_guess: 0.0,
        };
        let eval = evaluate(
            self.params,
            &res.minimizer,
            &operating,
            integrated.soc_nominal,
            integrated.internal_temperature,
        )?;

        self.state = SimState {
            time: 0.0,
            step: 0,
            inputs,
            integrated,
            derived: DerivedState::from(&eval),
            degradation: DegradationState::new(init.soh, init.soc),
        };
        self.initialized = true;
        self.finished = false;
        debug!(
            soc = integrated.soc_nominal,
            temperature = integrated.internal_temperature,
            soh = init.soh,
            "simulation initialized"
        );
        self.hooks.on_init(&self.state)
    }

    /// Forget integrator history and step size, then [`init`](Self::init)
    /// again. Nothing is reallocated.
    pub fn reset(&mut self) -> SimResult<()> {
        let res = self.resources.as_mut().ok_or(SimError::Resource {
            what: "simulation was cleaned up",
        })?;
        res.driver.reset();
        debug!("simulation reset");
        self.init()
    }

    /// Advance one `step_seconds` interval at constant `power` (W) and
    /// `ambient_temperature` (K).
    ///
    /// On error the committed state is unchanged and the integrator history
    /// is discarded; see [`SimError::is_recoverable`].
    pub fn step(&mut self, power: f64, ambient_temperature: f64) -> SimResult<()> {
        if !power.is_finite() {
            return Err(SimError::InvalidInput {
                what: "power must be finite",
            });
        }
        if !(ambient_temperature.is_finite() && ambient_temperature > 0.0) {
            return Err(SimError::InvalidInput {
                what: "ambient temperature must be a positive kelvin value",
            });
        }
        if !self.initialized {
            return Err(SimError::Config {
                what: "step called before init".to_string(),
            });
        }
        let res = self.resources.as_mut().ok_or(SimError::Resource {
            what: "simulation was cleaned up",
        })?;

        let next = match advance(
            &self.config,
            self.params,
            self.cycle.as_ref(),
            res,
            &self.state,
            Inputs {
                power,
                ambient_temperature,
            },
        ) {
            Ok(next) => next,
            Err(e) => {
                res.driver.discard_history();
                warn!(step = self.state.step + 1, power, ambient_temperature, error = %e, "step failed");
                return Err(e);
            }
        };

        self.state = next;
        trace!(
            step = next.step,
            time = next.time,
            soc = next.integrated.soc_nominal,
            temperature = next.integrated.internal_temperature,
            voltage = next.derived.voltage,
            current = next.derived.current,
            "step committed"
        );

        self.hooks.on_update(&self.state)?;
        if !self.finished && self.should_close() {
            self.finished = true;
            info!(
                steps = self.state.step,
                time = self.state.time,
                soc = self.state.integrated.soc_nominal,
                soh = self.state.degradation.soh,
                "simulation finished"
            );
            self.hooks.on_finished(&self.state)?;
        }
        Ok(())
    }

    /// Step once per sample of the two traces.
    ///
    /// Stops at the first failing step or once [`should_close`] holds.
    ///
    /// [`should_close`]: Self::should_close
    pub fn run(&mut self, power: &[f64], ambient_temperature: &[f64]) -> SimResult<RunSummary> {
        if power.len() != ambient_temperature.len() {
            return Err(SimError::Config {
                what: format!(
                    "power trace has {} samples but ambient temperature trace has {}",
                    power.len(),
                    ambient_temperature.len()
                ),
            });
        }

        let mut steps = 0;
        for (&p, &t_amb) in power.iter().zip(ambient_temperature) {
            if self.should_close() {
                break;
            }
            self.step(p, t_amb)?;
            steps += 1;
        }
        Ok(RunSummary {
            steps,
            closed: self.should_close(),
        })
    }

    /// Expected number of steps for a full run.
    pub fn max_iters(&self) -> usize {
        self.config.max_iters()
    }

    /// Whether the simulated time has reached the configured end.
    pub fn should_close(&self) -> bool {
        self.state.step as usize >= self.max_iters()
            || self.state.time >= self.config.time_seconds
    }

    /// Release the integrator and minimizer. Calling it again is a no-op.
    pub fn cleanup(&mut self) -> SimResult<()> {
        if self.resources.take().is_some() {
            debug!(steps = self.state.step, "simulation resources released");
        }
        self.initialized = false;
        Ok(())
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> &CellParams {
        self.params
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Integrator counters, `None` after `cleanup`.
    pub fn driver_stats(&self) -> Option<DriverStats> {
        self.resources.as_ref().map(|r| r.driver.stats())
    }
}

/// Compute the state after one step without touching `state`.
fn advance(
    config: &SimConfig,
    params: &CellParams,
    cycle: &(dyn CyclePolicy + Send),
    res: &mut Resources,
    state: &SimState,
    inputs: Inputs,
) -> SimResult<SimState> {
    let soh = state.degradation.soh;
    let operating = Operating {
        power: inputs.power,
        ambient_temperature: inputs.ambient_temperature,
        soh,
        current_guess: state.derived.current,
    };
    let system = SolverInputs::new(params, &res.minimizer, operating, config.jacobian);
    if inputs != state.inputs {
        // New inputs make the right-hand side jump at the step boundary.
        res.driver.discard_history();
    }

    let step = state.step + 1;
    let t1 = step as f64 * config.step_seconds;
    let mut t = state.time;
    let mut y = state.integrated.to_vector();
    res.driver
        .apply(&system, &mut t, t1, &mut y)
        .map_err(|e| SimError::ConvergenceFailed {
            what: e.to_string(),
        })?;

    let integrated = IntegratedState::from_vector(&y);
    if integrated.soc_nominal < 0.0 {
        return Err(SimError::NonPhysical {
            what: format!(
                "state of charge {} is negative at step {step}",
                integrated.soc_nominal
            ),
        });
    }
    let eval = system.evaluate(&y)?;

    let mut next = SimState {
        time: t1,
        step,
        inputs,
        integrated,
        derived: DerivedState::from(&eval),
        degradation: state.degradation,
    };
    next.degradation
        .record(state.integrated.soc_nominal, integrated.soc_nominal);

    if cycle.is_complete(&next) {
        let d = &mut next.degradation;
        let new_soh = next_soh(d.soh, d.depth(), d.soc_mean, params);
        info!(
            cycle = d.cycle + 1,
            depth = d.depth(),
            soc_mean = d.soc_mean,
            soh = new_soh,
            "cycle completed"
        );
        d.cycle += 1;
        d.soh = new_soh;
        d.start_cycle(integrated.soc_nominal);
        next.derived
            .update_capacity(integrated.soc_nominal, new_soh, params);
    }
    Ok(next)
}
