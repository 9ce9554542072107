//! Adaptive driver: step size control around a stepper.

use super::control::{Adjustment, ErrorControl};
use super::{OdeSystem, State, Stepper, StepperKind};
use crate::error::{SolverError, SolverResult};
use crate::newton::NewtonConfig;
use tracing::trace;

/// Driver configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriverConfig {
    /// Step tried first after construction or reset.
    pub h_init: f64,
    /// Smallest step before giving up.
    pub h_min: f64,
    pub epsabs: f64,
    pub epsrel: f64,
    /// Maximum accepted plus rejected steps per `apply` call.
    pub max_steps: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            h_init: 1.0,
            h_min: 1e-12,
            epsabs: 1e-6,
            epsrel: 1e-6,
            max_steps: 100_000,
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> SolverResult<()> {
        if !(self.h_init.is_finite() && self.h_init > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("h_init must be positive, got {}", self.h_init),
            });
        }
        if !(self.h_min.is_finite() && self.h_min > 0.0 && self.h_min <= self.h_init) {
            return Err(SolverError::ProblemSetup {
                what: format!("h_min must be in (0, h_init], got {}", self.h_min),
            });
        }
        if !(self.epsabs.is_finite() && self.epsabs >= 0.0)
            || !(self.epsrel.is_finite() && self.epsrel >= 0.0)
        {
            return Err(SolverError::ProblemSetup {
                what: "tolerances must be finite and non-negative".to_string(),
            });
        }
        if self.epsabs == 0.0 && self.epsrel == 0.0 {
            return Err(SolverError::ProblemSetup {
                what: "epsabs and epsrel cannot both be zero".to_string(),
            });
        }
        if self.max_steps == 0 {
            return Err(SolverError::ProblemSetup {
                what: "max_steps must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Step counters since construction or the last reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub accepted: usize,
    pub rejected: usize,
    /// Trial steps where the stepper itself failed.
    pub failed: usize,
}

/// Adaptive integrator for [`OdeSystem`]s.
#[derive(Clone, Debug)]
pub struct Driver {
    kind: StepperKind,
    config: DriverConfig,
    control: ErrorControl,
    stepper: Stepper,
    /// Step size to try next.
    h: f64,
    stats: DriverStats,
}

impl Driver {
    pub fn new(kind: StepperKind, config: DriverConfig) -> SolverResult<Self> {
        config.validate()?;
        Ok(Self {
            kind,
            config,
            control: ErrorControl::new(config.epsabs, config.epsrel),
            stepper: Stepper::new(kind, NewtonConfig::default()),
            h: config.h_init,
            stats: DriverStats::default(),
        })
    }

    pub fn kind(&self) -> StepperKind {
        self.kind
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Step size that the next `apply` will try first.
    pub fn step_size(&self) -> f64 {
        self.h
    }

    /// Forget step size and multistep history. Nothing is reallocated.
    pub fn reset(&mut self) {
        self.h = self.config.h_init;
        self.stepper.reset();
        self.stats = DriverStats::default();
    }

    /// Drop multistep history while keeping the step size and counters.
    ///
    /// Used when the caller discards the result of an `apply` call, so the
    /// next call cannot continue from a point that was never committed.
    pub fn discard_history(&mut self) {
        self.stepper.reset();
    }

    /// Advance `y` from `*t` to exactly `t1`.
    ///
    /// `t` and `y` are only written when the whole interval succeeds. A
    /// failing stepper evaluation halves the step; the call fails once the
    /// step drops below `h_min` or `max_steps` trial steps were spent.
    pub fn apply<S: OdeSystem + ?Sized>(
        &mut self,
        sys: &S,
        t: &mut f64,
        t1: f64,
        y: &mut State,
    ) -> SolverResult<()> {
        if !(t1.is_finite() && t.is_finite()) || t1 < *t {
            return Err(SolverError::ProblemSetup {
                what: format!("cannot integrate from {} to {t1}", *t),
            });
        }

        let mut tc = *t;
        let mut yc = *y;
        let mut h = self.h;
        let mut trials = 0usize;

        while tc < t1 {
            if trials >= self.config.max_steps {
                return Err(SolverError::ConvergenceFailed {
                    what: format!(
                        "{} exceeded {} steps at t = {tc}",
                        self.kind.name(),
                        self.config.max_steps
                    ),
                });
            }
            trials += 1;

            let remaining = t1 - tc;
            let last = h >= remaining;
            let h_try = if last { remaining } else { h };

            let out = match self.stepper.step(sys, tc, &yc, h_try) {
                Ok(out) => out,
                Err(e) => {
                    self.stats.failed += 1;
                    self.stepper.reset();
                    h = 0.5 * h_try;
                    trace!(t = tc, h_try, error = %e, "stepper failed, halving step");
                    if h < self.config.h_min {
                        return Err(SolverError::ConvergenceFailed {
                            what: format!("step size underflow at t = {tc}: {e}"),
                        });
                    }
                    continue;
                }
            };

            match self.control.adjust(&out.y, &out.err, out.order, h_try) {
                Adjustment::Decrease(h_new) => {
                    self.stats.rejected += 1;
                    trace!(t = tc, h_try, h_new, "step rejected");
                    h = h_new;
                    if h < self.config.h_min {
                        return Err(SolverError::ConvergenceFailed {
                            what: format!("step size underflow at t = {tc}"),
                        });
                    }
                }
                adj => {
                    self.stats.accepted += 1;
                    tc = if last { t1 } else { tc + h_try };
                    self.stepper.accept(tc);
                    yc = out.y;
                    // A shortened final step says nothing about the step size
                    // the dynamics allow.
                    h = if last { adj.step().max(h) } else { adj.step() };
                }
            }
        }

        self.h = h;
        *t = tc;
        *y = yc;
        Ok(())
    }
}
