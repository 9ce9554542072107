//! Current from a power request.
//!
//! Terminal voltage is `ocv - i·R` and the delivered power is
//! `(ocv - i·R)·i`. For a given power this is a quadratic in `i`; the
//! physical root lies below the maximum-power current `ocv/(2R)`, where the
//! squared power mismatch is unimodal. A bracketing minimizer locates it and
//! a few Newton iterations on the quadratic polish the result.

use crate::error::{CellError, CellResult};
use lion_solver::Minimizer;

/// Lower end of the current search interval (A).
pub const CURRENT_MIN: f64 = -1.0e3;

/// Upper end of the current search interval before the maximum-power cap (A).
pub const CURRENT_MAX: f64 = 1.0e3;

const POLISH_ITERS: usize = 4;

/// Largest power the cell can deliver, `ocv^2 / (4R)` (W).
#[inline]
pub fn max_power(ocv: f64, resistance: f64) -> f64 {
    ocv * ocv / (4.0 * resistance)
}

/// Delivered power at current `i` (W).
#[inline]
pub fn power_at(current: f64, ocv: f64, resistance: f64) -> f64 {
    (ocv - current * resistance) * current
}

/// Resolve the current that delivers `power` (W).
///
/// `guess` seeds the minimizer, normally with the last committed current.
///
/// # Errors
///
/// - [`CellError::NonPhysical`] for non-positive `ocv` or `resistance`, or a
///   non-finite input
/// - [`CellError::PowerLimit`] when `power` exceeds [`max_power`]
/// - [`CellError::Current`] when the minimizer does not converge
/// - [`CellError::NonPhysical`] when the root lies outside the search interval
pub fn resolve_current(
    power: f64,
    ocv: f64,
    resistance: f64,
    guess: f64,
    minimizer: &Minimizer,
) -> CellResult<f64> {
    if !power.is_finite() {
        return Err(CellError::NonPhysical { what: "power" });
    }
    if !(ocv.is_finite() && ocv > 0.0) {
        return Err(CellError::NonPhysical {
            what: "open-circuit voltage",
        });
    }
    if !(resistance.is_finite() && resistance > 0.0) {
        return Err(CellError::NonPhysical {
            what: "internal resistance",
        });
    }

    let max = max_power(ocv, resistance);
    if power > max {
        return Err(CellError::PowerLimit { power, max });
    }

    let upper = CURRENT_MAX.min(ocv / (2.0 * resistance));
    let target = |i: f64| {
        let mismatch = power - power_at(i, ocv, resistance);
        mismatch * mismatch
    };
    let found = minimizer.minimize(target, [CURRENT_MIN, upper], guess)?;

    let current = polish(found.x, power, ocv, resistance, upper);

    let residual = power - power_at(current, ocv, resistance);
    if residual.abs() > 1e-6 * power.abs().max(1.0) {
        return Err(CellError::NonPhysical {
            what: "current outside search interval",
        });
    }
    Ok(current)
}

/// Safeguarded Newton on `g(i) = (ocv - iR)i - P`, kept inside the search
/// interval and stopped at a stationary slope.
fn polish(mut current: f64, power: f64, ocv: f64, resistance: f64, upper: f64) -> f64 {
    for _ in 0..POLISH_ITERS {
        let g = power_at(current, ocv, resistance) - power;
        let slope = ocv - 2.0 * current * resistance;
        if g == 0.0 || slope <= 0.0 {
            break;
        }
        let next = (current - g / slope).clamp(CURRENT_MIN, upper);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// `di/d(ocv)` at a solution of the power balance.
#[inline]
pub fn current_gradient_wrt_ocv(current: f64, ocv: f64, resistance: f64) -> f64 {
    -current / (ocv - 2.0 * current * resistance)
}

/// `di/dR` at a solution of the power balance.
#[inline]
pub fn current_gradient_wrt_resistance(current: f64, ocv: f64, resistance: f64) -> f64 {
    current * current / (ocv - 2.0 * current * resistance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lion_solver::{MinimizeConfig, MinimizerKind, SolverError};

    fn minimizer(kind: MinimizerKind) -> Minimizer {
        Minimizer::new(kind, MinimizeConfig::default())
    }

    fn closed_form(power: f64, ocv: f64, r: f64) -> f64 {
        (ocv - (ocv * ocv - 4.0 * r * power).sqrt()) / (2.0 * r)
    }

    #[test]
    fn every_minimizer_matches_closed_form() {
        for kind in MinimizerKind::ALL {
            for power in [-20.0, -1.0, 0.0, 1.0, 10.0, 40.0] {
                let i = resolve_current(power, 3.7, 0.05, 0.0, &minimizer(kind)).unwrap();
                let exact = closed_form(power, 3.7, 0.05);
                assert!(
                    (i - exact).abs() < 1e-9 * exact.abs().max(1.0),
                    "{kind:?} P = {power}: {i} vs {exact}"
                );
            }
        }
    }

    #[test]
    fn zero_power_is_zero_current() {
        let i = resolve_current(0.0, 3.7, 0.05, 2.0, &minimizer(MinimizerKind::Brent)).unwrap();
        assert!(i.abs() < 1e-12);
    }

    #[test]
    fn power_above_limit_is_rejected() {
        let err = resolve_current(100.0, 3.7, 0.05, 0.0, &minimizer(MinimizerKind::Brent))
            .unwrap_err();
        match err {
            CellError::PowerLimit { power, max } => {
                assert_eq!(power, 100.0);
                assert!((max - 3.7 * 3.7 / 0.2).abs() < 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn bad_inputs_are_non_physical() {
        let m = minimizer(MinimizerKind::Brent);
        assert!(matches!(
            resolve_current(1.0, 0.0, 0.05, 0.0, &m),
            Err(CellError::NonPhysical { .. })
        ));
        assert!(matches!(
            resolve_current(1.0, 3.7, -0.05, 0.0, &m),
            Err(CellError::NonPhysical { .. })
        ));
        assert!(matches!(
            resolve_current(f64::NAN, 3.7, 0.05, 0.0, &m),
            Err(CellError::NonPhysical { .. })
        ));
    }

    #[test]
    fn charge_beyond_interval_is_reported() {
        // Root near -1455 A, outside the search interval.
        let m = minimizer(MinimizerKind::Brent);
        assert!(matches!(
            resolve_current(-7500.0, 3.7, 0.001, 0.0, &m),
            Err(CellError::NonPhysical { .. })
        ));
    }

    #[test]
    fn iteration_cap_is_a_solver_error() {
        let m = Minimizer::new(
            MinimizerKind::GoldenSection,
            MinimizeConfig::new(3, 1e-12, 1e-12).unwrap(),
        );
        assert!(matches!(
            resolve_current(5.0, 3.7, 0.05, 0.0, &m),
            Err(CellError::Current(SolverError::ConvergenceFailed { .. }))
        ));
    }

    #[test]
    fn gradients_match_finite_differences() {
        let m = minimizer(MinimizerKind::Brent);
        let (p, ocv, r) = (12.0, 3.8, 0.04);
        let i = resolve_current(p, ocv, r, 0.0, &m).unwrap();

        let h = 1e-6;
        let d_ocv = (closed_form(p, ocv + h, r) - closed_form(p, ocv - h, r)) / (2.0 * h);
        assert!((d_ocv - current_gradient_wrt_ocv(i, ocv, r)).abs() < 1e-6);

        let d_r = (closed_form(p, ocv, r + h) - closed_form(p, ocv, r - h)) / (2.0 * h);
        assert!((d_r - current_gradient_wrt_resistance(i, ocv, r)).abs() < 1e-5);
    }
}
