//! Cycle-level capacity fade.

use crate::params::CellParams;

/// State-of-health lost over one completed cycle.
///
/// `depth` is the state-of-charge excursion of the cycle and `soc_mean` its
/// time-averaged state of charge. Deep cycles and cycles spent at high charge
/// fade faster.
pub fn capacity_fade(depth: f64, soc_mean: f64, params: &CellParams) -> f64 {
    let d = &params.degradation;
    if depth <= 0.0 {
        return 0.0;
    }
    d.fade_rate * depth.powf(d.depth_exponent) * (d.mean_soc_coefficient * (soc_mean - 0.5)).exp()
}

/// State of health after a completed cycle. Never increases and never drops
/// below zero.
pub fn next_soh(soh: f64, depth: f64, soc_mean: f64, params: &CellParams) -> f64 {
    (soh - capacity_fade(depth, soc_mean, params).max(0.0)).max(0.0)
}
