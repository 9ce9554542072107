//! Adaptive integration of two-state ODE systems.
//!
//! The [`Driver`] advances a [`State`] across an interval with adaptive step
//! size control. The stepper family is chosen by [`StepperKind`]:
//! embedded and step-doubling Runge-Kutta methods, implicit Runge-Kutta
//! methods solved by Newton iteration, extrapolation methods, and
//! variable-step multistep methods.
//!
//! Everything works on `nalgebra` fixed-size vectors and matrices so a step
//! never touches the heap.

pub mod control;
mod driver;
mod explicit;
mod extrapolation;
mod implicit;
mod multistep;

pub use control::{Adjustment, ErrorControl};
pub use driver::{Driver, DriverConfig, DriverStats};

use crate::error::{SolverError, SolverResult};
use crate::jacobian::{DEFAULT_EPSILON, central_difference_jacobian};
use crate::newton::NewtonConfig;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Integrated state vector.
pub type State = Vector2<f64>;

/// Partial derivatives of the right-hand side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Jacobian {
    /// `df_i/dy_j`
    pub dfdy: Matrix2<f64>,
    /// `df_i/dt`
    pub dfdt: Vector2<f64>,
}

/// A two-state system `y' = f(t, y)`.
pub trait OdeSystem {
    /// Evaluate `f(t, y)`.
    fn rhs(&self, t: f64, y: &State) -> SolverResult<State>;

    /// Evaluate the Jacobian at `(t, y)`.
    ///
    /// The default uses symmetric central differences of [`OdeSystem::rhs`]
    /// in `y` and assumes an autonomous system (`dfdt = 0`).
    fn jacobian(&self, t: f64, y: &State) -> SolverResult<Jacobian> {
        let dfdy = central_difference_jacobian(y, |yp| self.rhs(t, yp), DEFAULT_EPSILON)?;
        Ok(Jacobian {
            dfdy,
            dfdt: Vector2::zeros(),
        })
    }
}

/// Stepping algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepperKind {
    /// Bogacki-Shampine 3(2).
    Rk2,
    /// Classical fourth order Runge-Kutta with step doubling.
    Rk4,
    /// Runge-Kutta-Fehlberg 4(5).
    #[default]
    Rkf45,
    /// Cash-Karp 4(5).
    Rkck,
    /// Gragg midpoint extrapolation to eighth order.
    Rk8,
    /// Implicit Euler.
    Rk1Imp,
    /// Implicit midpoint.
    Rk2Imp,
    /// Two-stage Gauss-Legendre.
    Rk4Imp,
    /// Bader-Deuflhard semi-implicit extrapolation.
    Bsimp,
    /// Adams-Bashforth-Moulton predictor-corrector, orders 1-4.
    MsAdams,
    /// Backward differentiation formulas, orders 1-3.
    MsBdf,
}

impl StepperKind {
    pub const ALL: [StepperKind; 11] = [
        StepperKind::Rk2,
        StepperKind::Rk4,
        StepperKind::Rkf45,
        StepperKind::Rkck,
        StepperKind::Rk8,
        StepperKind::Rk1Imp,
        StepperKind::Rk2Imp,
        StepperKind::Rk4Imp,
        StepperKind::Bsimp,
        StepperKind::MsAdams,
        StepperKind::MsBdf,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StepperKind::Rk2 => "rk2",
            StepperKind::Rk4 => "rk4",
            StepperKind::Rkf45 => "rkf45",
            StepperKind::Rkck => "rkck",
            StepperKind::Rk8 => "rk8",
            StepperKind::Rk1Imp => "rk1imp",
            StepperKind::Rk2Imp => "rk2imp",
            StepperKind::Rk4Imp => "rk4imp",
            StepperKind::Bsimp => "bsimp",
            StepperKind::MsAdams => "msadams",
            StepperKind::MsBdf => "msbdf",
        }
    }

    /// Whether the stepper evaluates the Jacobian.
    pub fn uses_jacobian(&self) -> bool {
        matches!(
            self,
            StepperKind::Rk1Imp
                | StepperKind::Rk2Imp
                | StepperKind::Rk4Imp
                | StepperKind::Bsimp
                | StepperKind::MsBdf
        )
    }
}

/// Result of one trial step.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StepOutput {
    pub y: State,
    /// Local error estimate.
    pub err: State,
    /// Order of the error estimate, used by step size control.
    pub order: usize,
}

/// Concrete stepper state, dispatched by kind.
#[derive(Clone, Debug)]
pub(crate) enum Stepper {
    Explicit(explicit::Explicit),
    Implicit(implicit::Implicit),
    Extrapolation(extrapolation::Extrapolation),
    Adams(multistep::Adams),
    Bdf(multistep::Bdf),
}

impl Stepper {
    pub(crate) fn new(kind: StepperKind, newton: NewtonConfig) -> Self {
        match kind {
            StepperKind::Rk2 => Stepper::Explicit(explicit::Explicit::BogackiShampine),
            StepperKind::Rk4 => Stepper::Explicit(explicit::Explicit::ClassicalDoubling),
            StepperKind::Rkf45 => Stepper::Explicit(explicit::Explicit::Fehlberg),
            StepperKind::Rkck => Stepper::Explicit(explicit::Explicit::CashKarp),
            StepperKind::Rk8 => Stepper::Extrapolation(extrapolation::Extrapolation::Gragg),
            StepperKind::Rk1Imp => {
                Stepper::Implicit(implicit::Implicit::new(implicit::Method::Euler, newton))
            }
            StepperKind::Rk2Imp => {
                Stepper::Implicit(implicit::Implicit::new(implicit::Method::Midpoint, newton))
            }
            StepperKind::Rk4Imp => {
                Stepper::Implicit(implicit::Implicit::new(implicit::Method::Gauss2, newton))
            }
            StepperKind::Bsimp => {
                Stepper::Extrapolation(extrapolation::Extrapolation::SemiImplicit)
            }
            StepperKind::MsAdams => Stepper::Adams(multistep::Adams::default()),
            StepperKind::MsBdf => Stepper::Bdf(multistep::Bdf::new(newton)),
        }
    }

    pub(crate) fn step<S: OdeSystem + ?Sized>(
        &mut self,
        sys: &S,
        t: f64,
        y: &State,
        h: f64,
    ) -> SolverResult<StepOutput> {
        let out = match self {
            Stepper::Explicit(s) => s.step(sys, t, y, h),
            Stepper::Implicit(s) => s.step(sys, t, y, h),
            Stepper::Extrapolation(s) => s.step(sys, t, y, h),
            Stepper::Adams(s) => s.step(sys, t, y, h),
            Stepper::Bdf(s) => s.step(sys, t, y, h),
        }?;

        if !(out.y.iter().all(|v| v.is_finite()) && out.err.iter().all(|v| v.is_finite())) {
            return Err(SolverError::Numeric {
                what: format!("non-finite step result at t = {t}, h = {h}"),
            });
        }
        Ok(out)
    }

    /// Called once the last trial step has been accepted; `t_new` is the
    /// time the caller records for the step end.
    pub(crate) fn accept(&mut self, t_new: f64) {
        match self {
            Stepper::Adams(s) => s.accept(t_new),
            Stepper::Bdf(s) => s.accept(t_new),
            _ => {}
        }
    }

    /// Drop any history carried between steps.
    pub(crate) fn reset(&mut self) {
        match self {
            Stepper::Adams(s) => s.reset(),
            Stepper::Bdf(s) => s.reset(),
            _ => {}
        }
    }
}
