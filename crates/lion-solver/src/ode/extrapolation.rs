//! Extrapolation steppers.
//!
//! A base method with an error expansion in even powers of the substep is
//! run with an increasing number of substeps, and the results are combined
//! by polynomial extrapolation to zero substep size. The difference between
//! the two highest diagonal entries of the table is the error estimate.

use super::{OdeSystem, State, StepOutput};
use crate::error::{SolverError, SolverResult};
use nalgebra::Matrix2;

const LEVELS: usize = 4;

/// Substep counts for the explicit modified midpoint rule.
const GRAGG_SEQUENCE: [usize; LEVELS] = [2, 4, 6, 8];

/// Substep counts for the semi-implicit midpoint rule.
const DEUFLHARD_SEQUENCE: [usize; LEVELS] = [2, 6, 10, 14];

/// Order of `T[LEVELS-1][LEVELS-2]`, the lower entry of the error estimate.
const ESTIMATE_ORDER: usize = 2 * (LEVELS - 1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Extrapolation {
    /// Gragg's modified midpoint rule.
    Gragg,
    /// Bader-Deuflhard semi-implicit midpoint rule.
    SemiImplicit,
}

impl Extrapolation {
    pub(crate) fn step<S: OdeSystem + ?Sized>(
        &self,
        sys: &S,
        t: f64,
        y: &State,
        h: f64,
    ) -> SolverResult<StepOutput> {
        let f0 = sys.rhs(t, y)?;
        let mut table = [[State::zeros(); LEVELS]; LEVELS];

        let sequence = match self {
            Extrapolation::Gragg => {
                for (i, &n) in GRAGG_SEQUENCE.iter().enumerate() {
                    table[i][0] = modified_midpoint(sys, t, y, &f0, h, n)?;
                }
                GRAGG_SEQUENCE
            }
            Extrapolation::SemiImplicit => {
                let jac = sys.jacobian(t, y)?;
                for (i, &n) in DEUFLHARD_SEQUENCE.iter().enumerate() {
                    table[i][0] = semi_implicit_midpoint(sys, t, y, &f0, &jac, h, n)?;
                }
                DEUFLHARD_SEQUENCE
            }
        };

        // Aitken-Neville in h^2
        for i in 1..LEVELS {
            for k in 1..=i {
                let ratio = sequence[i] as f64 / sequence[i - k] as f64;
                let denom = ratio * ratio - 1.0;
                table[i][k] = table[i][k - 1] + (table[i][k - 1] - table[i - 1][k - 1]) / denom;
            }
        }

        let best = table[LEVELS - 1][LEVELS - 1];
        Ok(StepOutput {
            y: best,
            err: best - table[LEVELS - 1][LEVELS - 2],
            order: ESTIMATE_ORDER,
        })
    }
}

/// Gragg's modified midpoint rule with `n` substeps and final smoothing.
fn modified_midpoint<S: OdeSystem + ?Sized>(
    sys: &S,
    t: f64,
    y: &State,
    f0: &State,
    h: f64,
    n: usize,
) -> SolverResult<State> {
    let hs = h / n as f64;
    let mut z_prev = *y;
    let mut z = y + f0 * hs;

    for m in 1..n {
        let f = sys.rhs(t + m as f64 * hs, &z)?;
        let z_next = z_prev + f * (2.0 * hs);
        z_prev = z;
        z = z_next;
    }

    let f_end = sys.rhs(t + h, &z)?;
    Ok((z + z_prev + f_end * hs) * 0.5)
}

/// Semi-implicit midpoint rule with `n` substeps.
fn semi_implicit_midpoint<S: OdeSystem + ?Sized>(
    sys: &S,
    t: f64,
    y: &State,
    f0: &State,
    jac: &super::Jacobian,
    h: f64,
    n: usize,
) -> SolverResult<State> {
    let hs = h / n as f64;
    let lu = (Matrix2::identity() - jac.dfdy * hs).lu();
    let solve = |rhs: State| -> SolverResult<State> {
        lu.solve(&rhs).ok_or_else(|| SolverError::Numeric {
            what: format!("singular iteration matrix for substep {hs}"),
        })
    };

    let mut delta = solve((f0 + jac.dfdt * hs) * hs)?;
    let mut ytemp = y + delta;
    let mut x = t + hs;

    for _ in 1..n {
        let f = sys.rhs(x, &ytemp)?;
        delta += solve(f * hs - delta)? * 2.0;
        ytemp += delta;
        x += hs;
    }

    let f = sys.rhs(x, &ytemp)?;
    Ok(ytemp + solve(f * hs - delta)?)
}
