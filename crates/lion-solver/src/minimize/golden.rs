use super::{GOLDEN, MinimizeConfig, Minimum, Objective, Search};

/// Golden-section search keeping a single interior point.
///
/// Each iteration probes into the larger of the two segments around the
/// current best point, so the bracket shrinks by a constant factor once the
/// interior point sits at a golden ratio position.
pub(super) fn search<F: FnMut(f64) -> f64>(
    f: &mut Objective<F>,
    mut lower: f64,
    mut upper: f64,
    mut x: f64,
    config: &MinimizeConfig,
) -> Search {
    let mut fx = f.eval(x);

    for iter in 0..config.max_iters() {
        if config.interval_converged(lower, upper) {
            return Search::Converged(Minimum {
                x,
                fx,
                iterations: iter,
            });
        }

        let w_lower = x - lower;
        let w_upper = upper - x;
        let u = if w_upper > w_lower {
            x + GOLDEN * w_upper
        } else {
            x - GOLDEN * w_lower
        };

        // Probe no longer distinguishable from the current point.
        if u == x {
            return Search::Converged(Minimum {
                x,
                fx,
                iterations: iter,
            });
        }

        let fu = f.eval(u);
        if fu < fx {
            if u > x {
                lower = x;
            } else {
                upper = x;
            }
            x = u;
            fx = fu;
        } else if u > x {
            upper = u;
        } else {
            lower = u;
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
