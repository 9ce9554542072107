//! Cycle completion rules.
//!
//! When a policy reports a completed cycle the simulation counts it, fades
//! the state of health from the cycle statistics, and restarts the
//! within-cycle accumulators.

use crate::config::CycleConfig;
use crate::state::SimState;

/// Decides whether the cycle in progress is complete.
pub trait CyclePolicy {
    /// Called after each committed step with the updated statistics.
    fn is_complete(&self, state: &SimState) -> bool;
}

/// One cycle per `depth` of accumulated discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquivalentFullCycle {
    pub depth: f64,
}

impl CyclePolicy for EquivalentFullCycle {
    fn is_complete(&self, state: &SimState) -> bool {
        state.degradation.acc_discharge >= self.depth
    }
}

/// One cycle per swing of at least `min_depth` that returns to within
/// `hysteresis` of the cycle maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocSwing {
    pub min_depth: f64,
    pub hysteresis: f64,
}

impl CyclePolicy for SocSwing {
    fn is_complete(&self, state: &SimState) -> bool {
        let d = &state.degradation;
        d.depth() >= self.min_depth
            && state.integrated.soc_nominal >= d.soc_max - self.hysteresis
    }
}

/// Build the configured policy.
pub fn from_config(config: &CycleConfig) -> Box<dyn CyclePolicy + Send> {
    match *config {
        CycleConfig::EquivalentFullCycle { depth } => Box::new(EquivalentFullCycle { depth }),
        CycleConfig::SocSwing {
            min_depth,
            hysteresis,
        } => Box::new(SocSwing {
            min_depth,
            hysteresis,
        }),
    }
}
