//! Simulation state.
//!
//! Only [`IntegratedState`] is advanced by the integrator. [`DerivedState`]
//! is recomputed from it after each committed step and [`DegradationState`]
//! carries the within-cycle bookkeeping.

use lion_cell::Evaluation;
use lion_cell::capacity::{nominal_capacity, usable_capacity, usable_soc};
use lion_cell::params::CellParams;
use lion_solver::ode::State;

/// Inputs applied over the current step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Inputs {
    /// Requested power (W), positive discharges.
    pub power: f64,
    /// Ambient temperature (K).
    pub ambient_temperature: f64,
}

/// The pair advanced by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntegratedState {
    pub soc_nominal: f64,
    /// Internal temperature (K).
    pub internal_temperature: f64,
}

impl IntegratedState {
    pub fn to_vector(self) -> State {
        State::new(self.soc_nominal, self.internal_temperature)
    }

    pub fn from_vector(y: &State) -> Self {
        Self {
            soc_nominal: y[0],
            internal_temperature: y[1],
        }
    }
}

/// Quantities recomputed from the integrated pair, inputs and state of
/// health.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedState {
    /// Terminal voltage (V).
    pub voltage: f64,
    pub current: f64,
    pub ref_open_circuit_voltage: f64,
    pub open_circuit_voltage: f64,
    pub internal_resistance: f64,
    pub ehc: f64,
    pub generated_heat: f64,
    /// Surface temperature (K).
    pub surface_temperature: f64,
    pub kappa: f64,
    /// Capacity at the present state of health (Ah).
    pub capacity_nominal: f64,
    pub soc_use: f64,
    /// Capacity available at the present temperature (Ah).
    pub capacity_use: f64,
}

impl From<&Evaluation> for DerivedState {
    fn from(e: &Evaluation) -> Self {
        Self {
            voltage: e.voltage,
            current: e.current,
            ref_open_circuit_voltage: e.ref_open_circuit_voltage,
            open_circuit_voltage: e.open_circuit_voltage,
            internal_resistance: e.internal_resistance,
            ehc: e.ehc,
            generated_heat: e.generated_heat,
            surface_temperature: e.surface_temperature,
            kappa: e.kappa,
            capacity_nominal: e.capacity_nominal,
            soc_use: e.soc_use,
            capacity_use: e.capacity_use,
        }
    }
}

impl DerivedState {
    /// Refresh the capacity fields after the state of health changed.
    pub fn update_capacity(&mut self, soc_nominal: f64, soh: f64, params: &CellParams) {
        self.capacity_nominal = nominal_capacity(soh, params);
        self.capacity_use = usable_capacity(self.capacity_nominal, self.kappa, params);
        self.soc_use = usable_soc(soc_nominal, self.capacity_nominal, self.capacity_use);
    }
}

/// Cycle counting and within-cycle statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DegradationState {
    pub cycle: u64,
    pub soh: f64,
    /// Steps since the current cycle started.
    pub cycle_step: u64,
    pub soc_mean: f64,
    pub soc_max: f64,
    pub soc_min: f64,
    /// Sum of state-of-charge decreases within the cycle.
    pub acc_discharge: f64,
}

impl DegradationState {
    pub fn new(soh: f64, soc: f64) -> Self {
        let mut d = Self {
            soh,
            ..Self::default()
        };
        d.start_cycle(soc);
        d
    }

    /// Reset the within-cycle accumulators, starting from `soc`.
    pub fn start_cycle(&mut self, soc: f64) {
        self.cycle_step = 0;
        self.soc_mean = soc;
        self.soc_max = soc;
        self.soc_min = soc;
        self.acc_discharge = 0.0;
    }

    /// Account for one committed step from `prev_soc` to `soc`.
    pub fn record(&mut self, prev_soc: f64, soc: f64) {
        self.cycle_step += 1;
        self.soc_mean += (soc - self.soc_mean) / self.cycle_step as f64;
        self.soc_max = self.soc_max.max(soc);
        self.soc_min = self.soc_min.min(soc);
        self.acc_discharge += (prev_soc - soc).max(0.0);
    }

    /// State-of-charge excursion within the cycle.
    pub fn depth(&self) -> f64 {
        self.soc_max - self.soc_min
    }
}

/// Complete simulation state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimState {
    /// Simulated time (s), `step · step_seconds`.
    pub time: f64,
    pub step: u64,
    pub inputs: Inputs,
    pub integrated: IntegratedState,
    pub derived: DerivedState,
    pub degradation: DegradationState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_round_trip() {
        let s = IntegratedState {
            soc_nominal: 0.4,
            internal_temperature: 301.0,
        };
        assert_eq!(IntegratedState::from_vector(&s.to_vector()), s);
    }

    #[test]
    fn record_tracks_statistics() {
        let path = [0.8, 0.7, 0.6, 0.65, 0.5];
        let mut d = DegradationState::new(1.0, path[0]);
        for w in path.windows(2) {
            d.record(w[0], w[1]);
        }
        assert_eq!(d.cycle_step, 4);
        assert!((d.soc_mean - 0.6125).abs() < 1e-12);
        assert_eq!(d.soc_max, 0.8);
        assert_eq!(d.soc_min, 0.5);
        assert!((d.acc_discharge - 0.35).abs() < 1e-12);
        assert!((d.depth() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn start_cycle_clears_accumulators() {
        let mut d = DegradationState::new(0.9, 0.8);
        d.record(0.8, 0.3);
        d.cycle = 2;
        d.start_cycle(0.3);
        assert_eq!(d.cycle, 2);
        assert_eq!(d.soh, 0.9);
        assert_eq!(d.cycle_step, 0);
        assert_eq!(d.acc_discharge, 0.0);
        assert_eq!(d.soc_max, 0.3);
    }
}
