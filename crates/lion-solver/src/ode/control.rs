//! Standard step size control.
//!
//! The desired error level for component `i` is `D_i = epsabs + epsrel |y_i|`.
//! With `r = max_i |err_i| / D_i`, a step is rejected when `r > 1.1` and the
//! step grows when `r < 0.5`.

use super::State;

const SAFETY: f64 = 0.9;
const MAX_SHRINK: f64 = 0.2;
const MAX_GROWTH: f64 = 5.0;
const REJECT_ABOVE: f64 = 1.1;
const GROW_BELOW: f64 = 0.5;

/// Outcome of a step size adjustment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    /// Error too large: retry with the new step.
    Decrease(f64),
    /// Error comfortably small: use the new step next time.
    Increase(f64),
    Same(f64),
}

impl Adjustment {
    pub fn step(&self) -> f64 {
        match *self {
            Adjustment::Decrease(h) | Adjustment::Increase(h) | Adjustment::Same(h) => h,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorControl {
    pub epsabs: f64,
    pub epsrel: f64,
}

impl ErrorControl {
    pub fn new(epsabs: f64, epsrel: f64) -> Self {
        Self { epsabs, epsrel }
    }

    /// Largest ratio of estimated to desired error over the components.
    pub fn ratio(&self, y: &State, err: &State) -> f64 {
        let mut rmax: f64 = 0.0;
        for i in 0..y.len() {
            let desired = self.epsabs + self.epsrel * y[i].abs();
            let e = err[i].abs();
            let r = if desired > 0.0 {
                e / desired
            } else if e == 0.0 {
                0.0
            } else {
                f64::INFINITY
            };
            rmax = rmax.max(r);
        }
        rmax
    }

    /// New step size for an error estimate of order `order` taken with step `h`.
    pub fn adjust(&self, y: &State, err: &State, order: usize, h: f64) -> Adjustment {
        let rmax = self.ratio(y, err);
        let q = order.max(1) as f64;

        if rmax > REJECT_ABOVE {
            let r = if rmax.is_finite() {
                (SAFETY * rmax.powf(-1.0 / q)).max(MAX_SHRINK)
            } else {
                MAX_SHRINK
            };
            Adjustment::Decrease(h * r)
        } else if rmax < GROW_BELOW {
            let r = if rmax > 0.0 {
                (SAFETY * rmax.powf(-1.0 / (q + 1.0))).clamp(1.0, MAX_GROWTH)
            } else {
                MAX_GROWTH
            };
            Adjustment::Increase(h * r)
        } else {
            Adjustment::Same(h)
        }
    }
}
