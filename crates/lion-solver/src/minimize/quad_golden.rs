use super::{GOLDEN, MinimizeConfig, Minimum, Objective, SQRT_EPSILON, Search};

/// Shrink factor two iterations must beat before a golden step is forced.
const STALL_RATIO: f64 = 0.5;

/// Safeguarded quadratic search.
///
/// A parabola through the three best points proposes the next probe. The
/// proposal is accepted only when the parabola opens upward, the probe stays
/// `tol` inside the bracket, and the step is shorter than half the step
/// before last. When two consecutive iterations fail to halve the bracket a
/// golden-section step is forced.
pub(super) fn search<F: FnMut(f64) -> f64>(
    f: &mut Objective<F>,
    mut lower: f64,
    mut upper: f64,
    x0: f64,
    config: &MinimizeConfig,
) -> Search {
    let mut x = x0;
    let mut fx = f.eval(x);
    // Second and third best points.
    let mut w = x;
    let mut fw = fx;
    let mut v = x;
    let mut fv = fx;

    let mut step_prev = upper - lower;
    let mut step_prev2 = upper - lower;
    // Bracket widths at the start of the previous two iterations.
    let mut widths = [upper - lower; 2];
    let mut window = 0usize;

    for iter in 0..config.max_iters() {
        let mid = 0.5 * (lower + upper);
        let tol = SQRT_EPSILON * x.abs() + f64::EPSILON;

        if config.interval_converged(lower, upper)
            || (x - mid).abs() <= 2.0 * tol - 0.5 * (upper - lower)
        {
            return Search::Converged(Minimum {
                x,
                fx,
                iterations: iter,
            });
        }

        let width = upper - lower;
        let stalled = window >= 2 && width > STALL_RATIO * widths[1];

        let proposal = if stalled {
            None
        } else {
            parabola_vertex(x, fx, w, fw, v, fv).filter(|&p| {
                p > lower + tol && p < upper - tol && (p - x).abs() < 0.5 * step_prev2
            })
        };

        let mut u = match proposal {
            Some(p) => p,
            None if x < mid => x + GOLDEN * (upper - x),
            None => x - GOLDEN * (x - lower),
        };
        if (u - x).abs() < tol {
            u = if x < mid { x + tol } else { x - tol };
        }

        let fu = f.eval(u);

        step_prev2 = step_prev;
        step_prev = (u - x).abs();

        if fu <= fx {
            if u < x {
                upper = x;
            } else {
                lower = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                lower = u;
            } else {
                upper = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }

        widths = [width, widths[0]];
        window = if stalled { 0 } else { window + 1 };
    }

    if config.interval_converged(lower, upper) {
        return Search::Converged(Minimum {
            x,
            fx,
            iterations: config.max_iters(),
        });
    }
    Search::Exhausted { lower, upper, x }
}

/// Abscissa of the vertex of the parabola through three distinct points,
/// if the parabola opens upward.
fn parabola_vertex(x: f64, fx: f64, w: f64, fw: f64, v: f64, fv: f64) -> Option<f64> {
    if x == w || x == v || w == v {
        return None;
    }
    let curvature = ((fw - fx) / (w - x) - (fv - fx) / (v - x)) / (w - v);
    if !curvature.is_finite() || curvature <= 0.0 {
        return None;
    }
    let num = (x - w) * (x - w) * (fx - fv) - (x - v) * (x - v) * (fx - fw);
    let den = (x - w) * (fx - fv) - (x - v) * (fx - fw);
    if den == 0.0 {
        return None;
    }
    let p = x - 0.5 * num / den;
    p.is_finite().then_some(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_of_exact_parabola() {
        let f = |x: f64| 2.0 * (x - 0.3) * (x - 0.3) + 1.0;
        let p = parabola_vertex(0.0, f(0.0), 1.0, f(1.0), -0.5, f(-0.5)).unwrap();
        assert!((p - 0.3).abs() < 1e-12);
    }

    #[test]
    fn downward_parabola_is_rejected() {
        let f = |x: f64| -(x * x);
        assert!(parabola_vertex(0.1, f(0.1), 1.0, f(1.0), -0.5, f(-0.5)).is_none());
    }

    #[test]
    fn coincident_points_are_rejected() {
        assert!(parabola_vertex(1.0, 0.0, 1.0, 0.0, 2.0, 1.0).is_none());
    }
}
