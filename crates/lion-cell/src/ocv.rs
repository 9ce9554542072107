//! Open-circuit voltage curve.
//!
//! The curve combines an exponential relaxation toward `v0` at full charge,
//! a linear slope, and a square-root exponential knee near empty. Both
//! functions are pure and do not check the range of `soc`.

use crate::params::CellParams;

/// Open-circuit voltage at the reference temperature (V).
#[inline]
pub fn voltage_ocv(soc: f64, params: &CellParams) -> f64 {
    let p = &params.ocv;
    let relaxation = (p.v0 - p.vl) * (p.gamma * (soc - 1.0)).exp();
    let slope = p.alpha * p.vl * (soc - 1.0);
    let knee = (1.0 - p.alpha) * p.vl * ((-p.beta).exp() - (-p.beta * soc.sqrt()).exp());
    p.vl + relaxation + slope + knee
}

/// Exact derivative of [`voltage_ocv`] with respect to `soc` (V).
///
/// Unbounded as `soc -> 0`.
#[inline]
pub fn voltage_ocv_gradient(soc: f64, params: &CellParams) -> f64 {
    let p = &params.ocv;
    let root = soc.sqrt();
    let relaxation = p.gamma * (p.v0 - p.vl) * (p.gamma * (soc - 1.0)).exp();
    let slope = p.alpha * p.vl;
    let knee = (1.0 - p.alpha) * p.vl * p.beta * (-p.beta * root).exp() / (2.0 * root);
    relaxation + slope + knee
}
