//! Run configuration.
//!
//! A [`SimConfig`] is fixed for the lifetime of a [`crate::Simulation`]. It
//! is serde-friendly and every field has a default, so project files may
//! give only the values they change.

use crate::error::{SimError, SimResult};
use lion_solver::{DriverConfig, MinimizeConfig, MinimizerKind, StepperKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Allowed deviation of `time_seconds / step_seconds` from an integer.
const STEP_RATIO_TOLERANCE: f64 = 1e-9;

/// Thermal domains the model accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    #[default]
    OnlySurface,
    OnlyAir,
    Both,
}

impl Regime {
    pub fn name(&self) -> &'static str {
        match self {
            Regime::OnlySurface => "only_surface",
            Regime::OnlyAir => "only_air",
            Regime::Both => "both",
        }
    }
}

/// How the integrator obtains the Jacobian of the cell model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JacobianMethod {
    #[default]
    Analytical,
    CentralDifference,
}

impl JacobianMethod {
    pub fn name(&self) -> &'static str {
        match self {
            JacobianMethod::Analytical => "analytical",
            JacobianMethod::CentralDifference => "central_difference",
        }
    }
}

/// Rule that decides when a charge/discharge cycle is complete.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CycleConfig {
    /// Complete once the accumulated discharge reaches `depth`.
    EquivalentFullCycle { depth: f64 },
    /// Complete once the excursion reaches `min_depth` and the state of
    /// charge is back within `hysteresis` of the cycle maximum.
    SocSwing { min_depth: f64, hysteresis: f64 },
}

impl Default for CycleConfig {
    fn default() -> Self {
        CycleConfig::EquivalentFullCycle { depth: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Logging destinations; consumed by the application that installs the
/// subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub console_level: LogLevel,
    pub file_level: LogLevel,
    /// Directory for timestamped log files; no file log when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LogLevel::Info,
            file_level: LogLevel::Trace,
            dir: None,
        }
    }
}

/// Configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    pub regime: Regime,
    pub stepper: StepperKind,
    pub minimizer: MinimizerKind,
    pub jacobian: JacobianMethod,
    /// Total simulated time (s).
    pub time_seconds: f64,
    /// Fixed interval between committed steps (s).
    pub step_seconds: f64,
    pub epsabs: f64,
    pub epsrel: f64,
    pub minimizer_max_iters: usize,
    pub cycle: CycleConfig,
    pub log: LogConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "lion".to_string(),
            regime: Regime::default(),
            stepper: StepperKind::default(),
            minimizer: MinimizerKind::default(),
            jacobian: JacobianMethod::default(),
            time_seconds: 3600.0,
            step_seconds: 1.0,
            epsabs: 1e-6,
            epsrel: 1e-6,
            minimizer_max_iters: 100,
            cycle: CycleConfig::default(),
            log: LogConfig::default(),
        }
    }
}

fn config_error(what: impl Into<String>) -> SimError {
    SimError::Config { what: what.into() }
}

impl SimConfig {
    /// Check the configuration before any numerical work.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.time_seconds.is_finite() && self.time_seconds >= 0.0) {
            return Err(config_error(format!(
                "time_seconds must be finite and non-negative, got {}",
                self.time_seconds
            )));
        }
        if !(self.step_seconds.is_finite() && self.step_seconds > 0.0) {
            return Err(config_error(format!(
                "step_seconds must be positive, got {}",
                self.step_seconds
            )));
        }
        if !(self.epsabs.is_finite() && self.epsabs >= 0.0) {
            return Err(config_error("epsabs must be finite and non-negative"));
        }
        if !(self.epsrel.is_finite() && self.epsrel >= 0.0) {
            return Err(config_error("epsrel must be finite and non-negative"));
        }
        if self.epsabs == 0.0 && self.epsrel == 0.0 {
            return Err(config_error("epsabs and epsrel cannot both be zero"));
        }
        if self.minimizer_max_iters == 0 {
            return Err(config_error("minimizer_max_iters must be positive"));
        }

        let ratio = self.time_seconds / self.step_seconds;
        if (ratio - ratio.round()).abs() > STEP_RATIO_TOLERANCE * ratio.max(1.0) {
            return Err(config_error(format!(
                "time_seconds ({}) is not a whole number of steps of {} s",
                self.time_seconds, self.step_seconds
            )));
        }

        if self.regime != Regime::OnlySurface {
            return Err(config_error(format!(
                "regime {} is not supported by the two-state model",
                self.regime.name()
            )));
        }

        match self.cycle {
            CycleConfig::EquivalentFullCycle { depth } => {
                if !(depth.is_finite() && depth > 0.0) {
                    return Err(config_error("cycle depth must be positive"));
                }
            }
            CycleConfig::SocSwing {
                min_depth,
                hysteresis,
            } => {
                if !(min_depth.is_finite() && min_depth > 0.0 && min_depth <= 1.0) {
                    return Err(config_error("cycle min_depth must be in (0, 1]"));
                }
                if !(hysteresis.is_finite() && hysteresis >= 0.0) {
                    return Err(config_error("cycle hysteresis must be non-negative"));
                }
            }
        }
        Ok(())
    }

    /// Expected number of committed steps for a full run.
    pub fn max_iters(&self) -> usize {
        (self.time_seconds / self.step_seconds).round() as usize
    }

    /// Integrator settings derived from the step interval and tolerances.
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            h_init: self.step_seconds,
            h_min: self.step_seconds * 1e-9,
            epsabs: self.epsabs,
            epsrel: self.epsrel,
            max_steps: 10_000,
        }
    }

    /// Minimizer settings; the current is resolved to the integrator
    /// tolerances.
    pub fn minimize_config(&self) -> SimResult<MinimizeConfig> {
        MinimizeConfig::new(self.minimizer_max_iters, self.epsabs, self.epsrel)
            .map_err(|e| config_error(e.to_string()))
    }
}
