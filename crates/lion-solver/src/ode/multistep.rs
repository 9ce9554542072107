//! Variable-step multistep methods.
//!
//! Both methods keep a short history of accepted points and build their
//! formulas from Lagrange polynomials through those points, so the history
//! stays usable across step size changes. A history is only continued when
//! a step starts exactly at the last accepted point; anything else restarts
//! at order one.

use super::{OdeSystem, State, StepOutput};
use crate::error::SolverResult;
use crate::newton::{NewtonConfig, newton_solve};
use nalgebra::Matrix2;

const CAPACITY: usize = 4;
const ADAMS_MAX_ORDER: usize = 4;
const BDF_MAX_ORDER: usize = 3;

/// Milne factors `C_corrector / (C_corrector - C_predictor)` for PECE Adams.
const ADAMS_MILNE: [f64; ADAMS_MAX_ORDER] = [1.0 / 2.0, 1.0 / 6.0, 1.0 / 10.0, 19.0 / 270.0];

/// Corrector/predictor error factors for BDF with an Euler predictor at
/// order one and polynomial extrapolation above.
const BDF_ERROR: [f64; BDF_MAX_ORDER] = [1.0 / 2.0, 2.0 / 11.0, 3.0 / 25.0];

/// Two-point Gauss-Legendre nodes on `[0, 1]`.
const GAUSS_NODES: [f64; 2] = [0.5 - 0.288_675_134_594_812_9, 0.5 + 0.288_675_134_594_812_9];

#[derive(Clone, Copy, Debug, PartialEq)]
struct Point {
    t: f64,
    y: State,
    f: State,
}

/// Most recent point first.
#[derive(Clone, Debug)]
struct History {
    points: [Point; CAPACITY],
    len: usize,
    pending: Option<Point>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            points: [Point {
                t: 0.0,
                y: State::zeros(),
                f: State::zeros(),
            }; CAPACITY],
            len: 0,
            pending: None,
        }
    }
}

impl History {
    fn clear(&mut self) {
        self.len = 0;
        self.pending = None;
    }

    fn push(&mut self, p: Point) {
        self.points.copy_within(0..CAPACITY - 1, 1);
        self.points[0] = p;
        self.len = (self.len + 1).min(CAPACITY);
    }

    /// Make sure the newest point is `(t, y)`, restarting otherwise.
    fn anchor<S: OdeSystem + ?Sized>(&mut self, sys: &S, t: f64, y: &State) -> SolverResult<()> {
        self.pending = None;
        if self.len > 0 && self.points[0].t == t && self.points[0].y == *y {
            return Ok(());
        }
        self.clear();
        let f = sys.rhs(t, y)?;
        self.push(Point { t, y: *y, f });
        Ok(())
    }

    fn accept(&mut self, t_new: f64) {
        if let Some(mut p) = self.pending.take() {
            p.t = t_new;
            self.push(p);
        }
    }
}

/// Lagrange interpolation through `(nodes[i], values[i])` evaluated at `x`.
fn interpolate(nodes: &[f64], values: &[State], x: f64) -> State {
    let mut acc = State::zeros();
    for (j, (&tj, vj)) in nodes.iter().zip(values).enumerate() {
        let mut basis = 1.0;
        for (m, &tm) in nodes.iter().enumerate() {
            if m != j {
                basis *= (x - tm) / (tj - tm);
            }
        }
        acc += vj * basis;
    }
    acc
}

/// `∫_t^{t+h} p(s) ds` for the interpolant `p` of degree at most three.
fn integrate(nodes: &[f64], values: &[State], t: f64, h: f64) -> State {
    let mut acc = State::zeros();
    for c in GAUSS_NODES {
        acc += interpolate(nodes, values, t + c * h);
    }
    acc * (0.5 * h)
}

/// Weights `w_j = l_j'(nodes[0])` of the derivative of the interpolant at
/// its first node.
fn derivative_weights(nodes: &[f64], weights: &mut [f64]) {
    let x0 = nodes[0];
    weights[0] = nodes[1..].iter().map(|&tm| 1.0 / (x0 - tm)).sum();
    for j in 1..nodes.len() {
        let mut num = 1.0;
        let mut den = 1.0;
        for (m, &tm) in nodes.iter().enumerate() {
            if m == j {
                continue;
            }
            den *= nodes[j] - tm;
            if m != 0 {
                num *= x0 - tm;
            }
        }
        weights[j] = num / den;
    }
}

/// Adams-Bashforth predictor, Adams-Moulton corrector, PECE mode.
#[derive(Clone, Debug, Default)]
pub(crate) struct Adams {
    history: History,
}

impl Adams {
    pub(crate) fn step<S: OdeSystem + ?Sized>(
        &mut self,
        sys: &S,
        t: f64,
        y: &State,
        h: f64,
    ) -> SolverResult<StepOutput> {
        self.history.anchor(sys, t, y)?;
        let k = self.history.len.min(ADAMS_MAX_ORDER);

        let mut nodes = [0.0; ADAMS_MAX_ORDER];
        let mut values = [State::zeros(); ADAMS_MAX_ORDER];
        for i in 0..k {
            nodes[i] = self.history.points[i].t;
            values[i] = self.history.points[i].f;
        }
        let y_pred = y + integrate(&nodes[..k], &values[..k], t, h);
        let f_pred = sys.rhs(t + h, &y_pred)?;

        // Corrector replaces the oldest point with the predicted one.
        let mut c_nodes = [0.0; ADAMS_MAX_ORDER];
        let mut c_values = [State::zeros(); ADAMS_MAX_ORDER];
        c_nodes[0] = t + h;
        c_values[0] = f_pred;
        for i in 1..k {
            c_nodes[i] = nodes[i - 1];
            c_values[i] = values[i - 1];
        }
        let y_corr = y + integrate(&c_nodes[..k], &c_values[..k], t, h);
        let f_corr = sys.rhs(t + h, &y_corr)?;

        self.history.pending = Some(Point {
            t: t + h,
            y: y_corr,
            f: f_corr,
        });

        Ok(StepOutput {
            y: y_corr,
            err: (y_corr - y_pred) * ADAMS_MILNE[k - 1],
            order: k,
        })
    }

    pub(crate) fn accept(&mut self, t_new: f64) {
        self.history.accept(t_new);
    }

    pub(crate) fn reset(&mut self) {
        self.history.clear();
    }
}

/// Backward differentiation formulas, corrector solved by Newton iteration.
#[derive(Clone, Debug)]
pub(crate) struct Bdf {
    history: History,
    newton: NewtonConfig,
}

impl Bdf {
    pub(crate) fn new(newton: NewtonConfig) -> Self {
        Self {
            history: History::default(),
            newton,
        }
    }

    pub(crate) fn step<S: OdeSystem + ?Sized>(
        &mut self,
        sys: &S,
        t: f64,
        y: &State,
        h: f64,
    ) -> SolverResult<StepOutput> {
        self.history.anchor(sys, t, y)?;
        let n = self.history.len;
        // Order k needs k points in the formula and k + 1 for the predictor.
        let k = if n < 3 { 1 } else { (n - 1).min(BDF_MAX_ORDER) };
        let points = &self.history.points;

        let y_pred = if k == 1 {
            y + points[0].f * h
        } else {
            let mut nodes = [0.0; CAPACITY];
            let mut values = [State::zeros(); CAPACITY];
            for i in 0..=k {
                nodes[i] = points[i].t;
                values[i] = points[i].y;
            }
            interpolate(&nodes[..=k], &values[..=k], t + h)
        };

        let mut nodes = [0.0; BDF_MAX_ORDER + 1];
        nodes[0] = t + h;
        for i in 0..k {
            nodes[i + 1] = points[i].t;
        }
        let mut alpha = [0.0; BDF_MAX_ORDER + 1];
        derivative_weights(&nodes[..=k], &mut alpha[..=k]);

        // h * (alpha_0 Y + sum_j alpha_j y_j - f(t + h, Y)) = 0
        let mut known = State::zeros();
        for j in 1..=k {
            known += points[j - 1].y * alpha[j];
        }
        let jac = sys.jacobian(t, y)?.dfdy;
        let m = Matrix2::identity() * (h * alpha[0]) - jac * h;
        let t1 = t + h;

        let res = newton_solve(
            y_pred,
            |yy: &State| Ok((yy * alpha[0] + known - sys.rhs(t1, yy)?) * h),
            |_: &State| Ok(m),
            &self.newton,
        )?;
        let y_corr = res.x;
        let f_corr = sys.rhs(t1, &y_corr)?;

        self.history.pending = Some(Point {
            t: t1,
            y: y_corr,
            f: f_corr,
        });

        Ok(StepOutput {
            y: y_corr,
            err: (y_corr - y_pred) * BDF_ERROR[k - 1],
            order: k,
        })
    }

    pub(crate) fn accept(&mut self, t_new: f64) {
        self.history.accept(t_new);
    }

    pub(crate) fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_reproduces_cubic() {
        let p = |x: f64| State::new(x * x * x - x, 2.0 * x * x);
        let nodes = [0.0, 0.5, 1.5, 3.0];
        let values = nodes.map(p);
        let got = interpolate(&nodes, &values, 2.2);
        assert!((got - p(2.2)).norm() < 1e-12);
    }

    #[test]
    fn gauss_integration_is_exact_for_cubic() {
        let p = |x: f64| State::new(x * x * x, 1.0);
        let nodes = [0.0, 1.0, 2.0, 4.0];
        let values = nodes.map(p);
        let got = integrate(&nodes, &values, 1.0, 2.0);
        // ∫_1^3 x^3 dx = (81 - 1)/4 = 20
        assert!((got[0] - 20.0).abs() < 1e-12);
        assert!((got[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn derivative_weights_match_bdf2() {
        // Equal spacing h = 1: 3/2 y_{n+1} - 2 y_n + 1/2 y_{n-1}
        let nodes = [2.0, 1.0, 0.0];
        let mut w = [0.0; 3];
        derivative_weights(&nodes, &mut w);
        assert!((w[0] - 1.5).abs() < 1e-14);
        assert!((w[1] + 2.0).abs() < 1e-14);
        assert!((w[2] - 0.5).abs() < 1e-14);
    }

    struct Decay;

    impl OdeSystem for Decay {
        fn rhs(&self, _t: f64, y: &State) -> SolverResult<State> {
            Ok(State::new(-y[0], -0.5 * y[1]))
        }
    }

    #[test]
    fn adams_raises_order_with_history() {
        let mut adams = Adams::default();
        let mut t: f64 = 0.0;
        let mut y = State::new(1.0, 1.0);
        let mut orders = Vec::new();
        for _ in 0..6 {
            let out = adams.step(&Decay, t, &y, 0.01).unwrap();
            adams.accept(t + 0.01);
            orders.push(out.order);
            t += 0.01;
            y = out.y;
        }
        assert_eq!(orders, vec![1, 2, 3, 4, 4, 4]);
        assert!((y[0] - (-t).exp()).abs() < 1e-4);
    }

    #[test]
    fn bdf_raises_order_with_history() {
        let mut bdf = Bdf::new(NewtonConfig::default());
        let mut t: f64 = 0.0;
        let mut y = State::new(1.0, 1.0);
        let mut orders = Vec::new();
        for _ in 0..5 {
            let out = bdf.step(&Decay, t, &y, 0.01).unwrap();
            bdf.accept(t + 0.01);
            orders.push(out.order);
            t += 0.01;
            y = out.y;
        }
        assert_eq!(orders, vec![1, 1, 2, 3, 3]);
        assert!((y[1] - (-0.5 * t).exp()).abs() < 1e-4);
    }

    #[test]
    fn unrelated_start_restarts_history() {
        let mut adams = Adams::default();
        let out = adams.step(&Decay, 0.0, &State::new(1.0, 1.0), 0.1).unwrap();
        adams.accept(0.1);
        assert_eq!(out.order, 1);
        let out = adams.step(&Decay, 0.1, &out.y, 0.1).unwrap();
        adams.accept(0.2);
        assert_eq!(out.order, 2);
        // Different start point: back to order one.
        let out = adams.step(&Decay, 5.0, &State::new(2.0, 2.0), 0.1).unwrap();
        assert_eq!(out.order, 1);
    }

    #[test]
    fn rejected_step_is_not_recorded() {
        let mut adams = Adams::default();
        let y0 = State::new(1.0, 1.0);
        let _ = adams.step(&Decay, 0.0, &y0, 0.5).unwrap();
        // Retry from the same point with a smaller step, no accept in between.
        let out = adams.step(&Decay, 0.0, &y0, 0.1).unwrap();
        assert_eq!(out.order, 1);
        assert_eq!(adams.history.len, 1);
    }
}
