//! Implicit Runge-Kutta steppers.
//!
//! Stage equations are solved with Newton iteration against an iteration
//! matrix built from the Jacobian at the start of the step. The error is
//! estimated by step doubling.

use super::{OdeSystem, State, StepOutput};
use crate::error::SolverResult;
use crate::newton::{NewtonConfig, newton_solve};
use nalgebra::{Matrix2, Matrix4, Vector4};

const SQRT3: f64 = 1.732_050_807_568_877_2;

/// Gauss-Legendre nodes `1/2 -+ sqrt(3)/6`.
const GAUSS_C: [f64; 2] = [0.5 - SQRT3 / 6.0, 0.5 + SQRT3 / 6.0];
const GAUSS_A: [[f64; 2]; 2] = [[0.25, 0.25 - SQRT3 / 6.0], [0.25 + SQRT3 / 6.0, 0.25]];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Method {
    Euler,
    Midpoint,
    Gauss2,
}

impl Method {
    fn order(&self) -> usize {
        match self {
            Method::Euler => 1,
            Method::Midpoint => 2,
            Method::Gauss2 => 4,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Implicit {
    method: Method,
    newton: NewtonConfig,
}

impl Implicit {
    pub(crate) fn new(method: Method, newton: NewtonConfig) -> Self {
        Self { method, newton }
    }

    pub(crate) fn step<S: OdeSystem + ?Sized>(
        &self,
        sys: &S,
        t: f64,
        y: &State,
        h: f64,
    ) -> SolverResult<StepOutput> {
        let jac = sys.jacobian(t, y)?.dfdy;

        let full = self.single(sys, &jac, t, y, h)?;
        let mid = self.single(sys, &jac, t, y, 0.5 * h)?;
        let half = self.single(sys, &jac, t + 0.5 * h, &mid, 0.5 * h)?;

        let p = self.method.order();
        let scale = f64::from((1u32 << p) - 1);
        Ok(StepOutput {
            y: half,
            err: (half - full) / scale,
            order: p,
        })
    }

    fn single<S: OdeSystem + ?Sized>(
        &self,
        sys: &S,
        jac: &Matrix2<f64>,
        t: f64,
        y: &State,
        h: f64,
    ) -> SolverResult<State> {
        match self.method {
            Method::Euler => {
                // Y - y - h f(t + h, Y) = 0
                let m = Matrix2::identity() - jac * h;
                let res = newton_solve(
                    *y,
                    |yy: &State| Ok(yy - y - sys.rhs(t + h, yy)? * h),
                    |_: &State| Ok(m),
                    &self.newton,
                )?;
                Ok(res.x)
            }
            Method::Midpoint => {
                // Z - y - (h/2) f(t + h/2, Z) = 0, then y1 = 2Z - y
                let m = Matrix2::identity() - jac * (0.5 * h);
                let res = newton_solve(
                    *y,
                    |z: &State| Ok(z - y - sys.rhs(t + 0.5 * h, z)? * (0.5 * h)),
                    |_: &State| Ok(m),
                    &self.newton,
                )?;
                Ok(res.x * 2.0 - y)
            }
            Method::Gauss2 => gauss2(sys, jac, t, y, h, &self.newton),
        }
    }
}

/// Two-stage Gauss-Legendre step on stage increments `z_i = Y_i - y`.
fn gauss2<S: OdeSystem + ?Sized>(
    sys: &S,
    jac: &Matrix2<f64>,
    t: f64,
    y: &State,
    h: f64,
    newton: &NewtonConfig,
) -> SolverResult<State> {
    let mut m = Matrix4::<f64>::identity();
    for i in 0..2 {
        for j in 0..2 {
            let block = jac * (-h * GAUSS_A[i][j]);
            let mut view = m.fixed_view_mut::<2, 2>(2 * i, 2 * j);
            view += block;
        }
    }

    let residual = |z: &Vector4<f64>| -> SolverResult<Vector4<f64>> {
        let z1 = State::new(z[0], z[1]);
        let z2 = State::new(z[2], z[3]);
        let f1 = sys.rhs(t + GAUSS_C[0] * h, &(y + z1))?;
        let f2 = sys.rhs(t + GAUSS_C[1] * h, &(y + z2))?;
        let r1 = z1 - (f1 * GAUSS_A[0][0] + f2 * GAUSS_A[0][1]) * h;
        let r2 = z2 - (f1 * GAUSS_A[1][0] + f2 * GAUSS_A[1][1]) * h;
        Ok(Vector4::new(r1[0], r1[1], r2[0], r2[1]))
    };

    let res = newton_solve(Vector4::zeros(), residual, |_: &Vector4<f64>| Ok(m), newton)?;
    let z = res.x;

    // b^T A^-1 = [-sqrt(3), sqrt(3)], so y1 = y + sqrt(3) (z2 - z1).
    let z1 = State::new(z[0], z[1]);
    let z2 = State::new(z[2], z[3]);
    Ok(y + (z2 - z1) * SQRT3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;

    struct Stiff;

    impl OdeSystem for Stiff {
        fn rhs(&self, _t: f64, y: &State) -> SolverResult<State> {
            Ok(State::new(-1000.0 * (y[0] - 1.0), -y[1]))
        }
    }

    #[test]
    fn stable_on_stiff_component() {
        for method in [Method::Euler, Method::Midpoint, Method::Gauss2] {
            let s = Implicit::new(method, NewtonConfig::default());
            let out = s.step(&Stiff, 0.0, &State::new(0.0, 1.0), 0.1).unwrap();
            assert!(out.y[0].abs() < 2.0, "{method:?}: {}", out.y[0]);
            assert!((out.y[1] - (-0.1f64).exp()).abs() < 1e-2, "{method:?}");
        }
    }

    #[test]
    fn gauss_is_fourth_order_on_decay() {
        let s = Implicit::new(Method::Gauss2, NewtonConfig::default());
        let out = s.step(&Stiff, 0.0, &State::new(1.0, 1.0), 0.2).unwrap();
        assert!((out.y[1] - (-0.2f64).exp()).abs() < 1e-7);
    }

    struct Failing;

    impl OdeSystem for Failing {
        fn rhs(&self, _t: f64, _y: &State) -> SolverResult<State> {
            Err(SolverError::Evaluation {
                what: "nope".to_string(),
            })
        }
    }

    #[test]
    fn evaluation_errors_propagate() {
        let s = Implicit::new(Method::Euler, NewtonConfig::default());
        assert!(s.step(&Failing, 0.0, &State::zeros(), 0.1).is_err());
    }
}
