use super::{GOLDEN, MinimizeConfig, Minimum, Objective, SQRT_EPSILON, Search};

/// Brent's method: parabolic interpolation through the three best points,
/// falling back to golden-section steps when the parabola misbehaves.
pub(super) fn search<F: FnMut(f64) -> f64>(
    f: &mut Objective<F>,
    mut lower: f64,
    mut upper: f64,
    x0: f64,
    config: &MinimizeConfig,
) -> Search {
    let mut x = x0;
    let mut w = x0;
    let mut v = x0;
    let mut fx = f.eval(x);
    let mut fw = fx;
    let mut fv = fx;

    // d: last step, e: step before last
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for iter in 0..config.max_iters() {
        let mid = 0.5 * (lower + upper);
        let tol = SQRT_EPSILON * x.abs() + f64::EPSILON;
        let tol2 = 2.0 * tol;

        if config.interval_converged(lower, upper) || (x - mid).abs() <= tol2 - 0.5 * (upper - lower)
        {
            return Search::Converged(Minimum {
                x,
                fx,
                iterations: iter,
            });
        }

        let mut take_golden = true;
        if e.abs() > tol {
            let mut r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            } else {
                q = -q;
            }
            r = e;
            e = d;

            if p.abs() < (0.5 * q * r).abs() && p > q * (lower - x) && p < q * (upper - x) {
                d = p / q;
                let u = x + d;
                // Keep the probe away from the bracket ends.
                if u - lower < tol2 || upper - u < tol2 {
                    d = if x < mid { tol } else { -tol };
                }
                take_golden = false;
            }
        }

        if take_golden {
            e = if x < mid { upper - x } else { lower - x };
            d = GOLDEN * e;
        }

        let u = if d.abs() >= tol {
            x + d
        } else if d > 0.0 {
            x + tol
        } else {
            x - tol
        };
        let fu = f.eval(u);

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
