//! The cell model as an ODE system for the integrator.

use crate::config::JacobianMethod;
use lion_cell::{CellError, CellParams, Evaluation, Operating, evaluate};
use lion_solver::jacobian::{DEFAULT_EPSILON, central_difference_jacobian};
use lion_solver::ode::{Jacobian, OdeSystem, State};
use lion_solver::{Minimizer, SolverError, SolverResult};
use nalgebra::Vector2;

/// Borrowed view handed to the integrator for one `apply` call.
///
/// Cell-model failures surface as [`SolverError::Evaluation`], which the
/// integrator answers by retrying with a smaller step.
#[derive(Debug, Clone, Copy)]
pub struct SolverInputs<'a> {
    params: &'a CellParams,
    minimizer: &'a Minimizer,
    operating: Operating,
    jacobian: JacobianMethod,
}

impl<'a> SolverInputs<'a> {
    pub fn new(
        params: &'a CellParams,
        minimizer: &'a Minimizer,
        operating: Operating,
        jacobian: JacobianMethod,
    ) -> Self {
        Self {
            params,
            minimizer,
            operating,
            jacobian,
        }
    }

    pub fn operating(&self) -> &Operating {
        &self.operating
    }

    /// Evaluate every instantaneous quantity at `y = (soc, T)`.
    pub fn evaluate(&self, y: &State) -> Result<Evaluation, CellError> {
        evaluate(self.params, self.minimizer, &self.operating, y[0], y[1])
    }
}

fn evaluation_error(e: CellError) -> SolverError {
    SolverError::Evaluation {
        what: e.to_string(),
    }
}

impl OdeSystem for SolverInputs<'_> {
    fn rhs(&self, _t: f64, y: &State) -> SolverResult<State> {
        let eval = self.evaluate(y).map_err(evaluation_error)?;
        Ok(State::new(eval.dsoc_dt, eval.dtemp_dt))
    }

    fn jacobian(&self, t: f64, y: &State) -> SolverResult<Jacobian> {
        let dfdy = match self.jacobian {
            JacobianMethod::Analytical => {
                self.evaluate(y).map_err(evaluation_error)?.jacobian(self.params)
            }
            JacobianMethod::CentralDifference => {
                central_difference_jacobian(y, |yp| self.rhs(t, yp), DEFAULT_EPSILON)?
            }
        };
        if !dfdy.iter().all(|v| v.is_finite()) {
            return Err(SolverError::Numeric {
                what: format!("non-finite Jacobian at soc = {}, T = {}", y[0], y[1]),
            });
        }
        Ok(Jacobian {
            dfdy,
            dfdt: Vector2::zeros(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lion_solver::{MinimizeConfig, MinimizerKind};

    fn inputs<'a>(
        params: &'a CellParams,
        minimizer: &'a Minimizer,
        jacobian: JacobianMethod,
    ) -> SolverInputs<'a> {
        SolverInputs::new(
            params,
            minimizer,
            Operating {
                power: 6.0,
                ambient_temperature: 295.0,
                soh: 1.0,
                current_guess: 0.0,
            },
            jacobian,
        )
    }

    #[test]
    fn strategies_agree() {
        let params = CellParams::generic();
        let minimizer = Minimizer::new(MinimizerKind::Brent, MinimizeConfig::default());
        let y = State::new(0.55, 302.0);

        let a = inputs(&params, &minimizer, JacobianMethod::Analytical)
            .jacobian(0.0, &y)
            .unwrap();
        let n = inputs(&params, &minimizer, JacobianMethod::CentralDifference)
            .jacobian(0.0, &y)
            .unwrap();

        for (x, z) in a.dfdy.iter().zip(n.dfdy.iter()) {
            assert!((x - z).abs() <= 1e-4 * x.abs() + 1e-9, "{x} vs {z}");
        }
        assert_eq!(a.dfdt, Vector2::zeros());
        assert_eq!(n.dfdt, Vector2::zeros());
    }

    #[test]
    fn cell_errors_become_evaluation_errors() {
        let params = CellParams::generic();
        let minimizer = Minimizer::new(MinimizerKind::Brent, MinimizeConfig::default());
        let sys = inputs(&params, &minimizer, JacobianMethod::Analytical);
        assert!(matches!(
            sys.rhs(0.0, &State::new(-0.1, 300.0)),
            Err(SolverError::Evaluation { .. })
        ));
    }

    #[test]
    fn rhs_matches_cell_rates() {
        let params = CellParams::generic();
        let minimizer = Minimizer::new(MinimizerKind::Brent, MinimizeConfig::default());
        let sys = inputs(&params, &minimizer, JacobianMethod::Analytical);
        let y = State::new(0.7, 298.15);
        let f = sys.rhs(0.0, &y).unwrap();
        let e = sys.evaluate(&y).unwrap();
        assert_eq!(f, State::from(e.rates()));
    }
}
