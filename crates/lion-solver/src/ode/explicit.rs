//! Explicit Runge-Kutta steppers.

use super::{OdeSystem, State, StepOutput};
use crate::error::SolverResult;

/// Butcher tableau of an embedded pair.
///
/// `b` propagates the solution and `e = b - b_hat` gives the error estimate.
struct Tableau<const S: usize> {
    c: [f64; S],
    a: [[f64; S]; S],
    b: [f64; S],
    e: [f64; S],
    /// Order of the error estimate.
    order: usize,
}

const BOGACKI_SHAMPINE: Tableau<4> = Tableau {
    c: [0.0, 1.0 / 2.0, 3.0 / 4.0, 1.0],
    a: [
        [0.0, 0.0, 0.0, 0.0],
        [1.0 / 2.0, 0.0, 0.0, 0.0],
        [0.0, 3.0 / 4.0, 0.0, 0.0],
        [2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
    ],
    b: [2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
    e: [
        2.0 / 9.0 - 7.0 / 24.0,
        1.0 / 3.0 - 1.0 / 4.0,
        4.0 / 9.0 - 1.0 / 3.0,
        -1.0 / 8.0,
    ],
    order: 2,
};

const FEHLBERG: Tableau<6> = Tableau {
    c: [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0],
    a: [
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 4.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0, 0.0],
        [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0, 0.0],
        [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0, 0.0],
        [-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0, 0.0],
    ],
    b: [
        16.0 / 135.0,
        0.0,
        6656.0 / 12825.0,
        28561.0 / 56430.0,
        -9.0 / 50.0,
        2.0 / 55.0,
    ],
    e: [
        16.0 / 135.0 - 25.0 / 216.0,
        0.0,
        6656.0 / 12825.0 - 1408.0 / 2565.0,
        28561.0 / 56430.0 - 2197.0 / 4104.0,
        -9.0 / 50.0 + 1.0 / 5.0,
        2.0 / 55.0,
    ],
    order: 4,
};

const CASH_KARP: Tableau<6> = Tableau {
    c: [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0],
    a: [
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
        [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0, 0.0],
        [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0, 0.0],
        [
            1631.0 / 55296.0,
            175.0 / 512.0,
            575.0 / 13824.0,
            44275.0 / 110592.0,
            253.0 / 4096.0,
            0.0,
        ],
    ],
    b: [
        37.0 / 378.0,
        0.0,
        250.0 / 621.0,
        125.0 / 594.0,
        0.0,
        512.0 / 1771.0,
    ],
    e: [
        37.0 / 378.0 - 2825.0 / 27648.0,
        0.0,
        250.0 / 621.0 - 18575.0 / 48384.0,
        125.0 / 594.0 - 13525.0 / 55296.0,
        -277.0 / 14336.0,
        512.0 / 1771.0 - 1.0 / 4.0,
    ],
    order: 4,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Explicit {
    BogackiShampine,
    ClassicalDoubling,
    Fehlberg,
    CashKarp,
}

impl Explicit {
    pub(crate) fn step<S: OdeSystem + ?Sized>(
        &self,
        sys: &S,
        t: f64,
        y: &State,
        h: f64,
    ) -> SolverResult<StepOutput> {
        match self {
            Explicit::BogackiShampine => embedded(&BOGACKI_SHAMPINE, sys, t, y, h),
            Explicit::Fehlberg => embedded(&FEHLBERG, sys, t, y, h),
            Explicit::CashKarp => embedded(&CASH_KARP, sys, t, y, h),
            Explicit::ClassicalDoubling => {
                let full = rk4(sys, t, y, h)?;
                let mid = rk4(sys, t, y, 0.5 * h)?;
                let half = rk4(sys, t + 0.5 * h, &mid, 0.5 * h)?;
                Ok(StepOutput {
                    y: half,
                    err: (half - full) / 15.0,
                    order: 4,
                })
            }
        }
    }
}

fn embedded<Sys: OdeSystem + ?Sized, const S: usize>(
    tab: &Tableau<S>,
    sys: &Sys,
    t: f64,
    y: &State,
    h: f64,
) -> SolverResult<StepOutput> {
    let mut k = [State::zeros(); S];
    for i in 0..S {
        let mut yi = *y;
        for j in 0..i {
            yi += k[j] * (h * tab.a[i][j]);
        }
        k[i] = sys.rhs(t + tab.c[i] * h, &yi)?;
    }

    let mut y_new = *y;
    let mut err = State::zeros();
    for i in 0..S {
        y_new += k[i] * (h * tab.b[i]);
        err += k[i] * (h * tab.e[i]);
    }

    Ok(StepOutput {
        y: y_new,
        err,
        order: tab.order,
    })
}

/// One classical RK4 step.
pub(crate) fn rk4<S: OdeSystem + ?Sized>(sys: &S, t: f64, y: &State, h: f64) -> SolverResult<State> {
    let k1 = sys.rhs(t, y)?;
    let k2 = sys.rhs(t + 0.5 * h, &(y + k1 * (0.5 * h)))?;
    let k3 = sys.rhs(t + 0.5 * h, &(y + k2 * (0.5 * h)))?;
    let k4 = sys.rhs(t + h, &(y + k3 * h))?;

    // Combine: y_new = y + (h/6) * (k1 + 2*k2 + 2*k3 + k4)
    Ok(y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0))
}
