//! Newton solver for small fixed-size systems.
//!
//! Used by the implicit ODE steppers, where the unknowns are stage values
//! and the Jacobian is usually an iteration matrix frozen for the step.

use crate::error::{SolverError, SolverResult};
use nalgebra::{Const, DimMin, SMatrix, SVector};

/// Newton solver configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm (against the initial residual)
    pub rel_tol: f64,
    /// Converged once the update is below `step_tol * (1 + |x|)`
    pub step_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            abs_tol: 1e-12,
            rel_tol: 1e-10,
            step_tol: 1e-12,
            line_search_beta: 0.5,
            max_line_search_iters: 8,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Copy, Debug)]
pub struct NewtonResult<const D: usize> {
    /// Solution vector
    pub x: SVector<f64, D>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Newton solver with backtracking line search.
pub fn newton_solve<const D: usize, F, J>(
    x0: SVector<f64, D>,
    mut residual_fn: F,
    mut jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult<D>>
where
    Const<D>: DimMin<Const<D>, Output = Const<D>>,
    F: FnMut(&SVector<f64, D>) -> SolverResult<SVector<f64, D>>,
    J: FnMut(&SVector<f64, D>) -> SolverResult<SMatrix<f64, D, D>>,
{
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if !r_norm.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual at iteration {iter}"),
            });
        }

        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x)?;

        // Solve J * dx = -r
        let dx = jac.lu().solve(&(-r)).ok_or_else(|| SolverError::Numeric {
            what: "Jacobian solve failed".to_string(),
        })?;

        let mut alpha = 1.0;
        let mut x_new = x + dx * alpha;
        let mut r_new = residual_fn(&x_new)?;
        let mut r_new_norm = r_new.norm();

        for _ in 0..config.max_line_search_iters {
            if r_new_norm.is_finite() && r_new_norm < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = x + dx * alpha;
            r_new = residual_fn(&x_new)?;
            r_new_norm = r_new.norm();
        }

        let step_norm = (dx * alpha).norm();
        x = x_new;
        r = r_new;
        r_norm = r_new_norm;

        if step_norm <= config.step_tol * (1.0 + x.norm()) && r_norm.is_finite() {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter + 1,
            });
        }
    }

    Err(SolverError::ConvergenceFailed {
        what: format!(
            "Maximum iterations {} reached, residual = {}",
            config.max_iterations, r_norm
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Matrix1, Matrix2, Vector1, Vector2};

    #[test]
    fn simple_quadratic() {
        // Solve x^2 - 4 = 0, x > 0
        let residual = |x: &Vector1<f64>| -> SolverResult<Vector1<f64>> {
            Ok(Vector1::new(x[0] * x[0] - 4.0))
        };
        let jacobian =
            |x: &Vector1<f64>| -> SolverResult<Matrix1<f64>> { Ok(Matrix1::new(2.0 * x[0])) };

        let result = newton_solve(Vector1::new(3.0), residual, jacobian, &NewtonConfig::default())
            .unwrap();

        assert!((result.x[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn frozen_matrix_linear_system() {
        // Linear system solved in one step even with a constant matrix.
        let a = Matrix2::new(3.0, 1.0, 1.0, 2.0);
        let b = Vector2::new(9.0, 8.0);
        let residual = |x: &Vector2<f64>| -> SolverResult<Vector2<f64>> { Ok(a * x - b) };
        let jacobian = |_: &Vector2<f64>| -> SolverResult<Matrix2<f64>> { Ok(a) };

        let result =
            newton_solve(Vector2::zeros(), residual, jacobian, &NewtonConfig::default()).unwrap();

        assert!((result.x[0] - 2.0).abs() < 1e-10);
        assert!((result.x[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn singular_matrix_is_numeric_error() {
        let residual = |x: &Vector2<f64>| -> SolverResult<Vector2<f64>> {
            Ok(Vector2::new(x[0] + 1.0, x[0] + 1.0))
        };
        let jacobian =
            |_: &Vector2<f64>| -> SolverResult<Matrix2<f64>> { Ok(Matrix2::new(1.0, 0.0, 1.0, 0.0)) };

        let err = newton_solve(Vector2::zeros(), residual, jacobian, &NewtonConfig::default())
            .unwrap_err();
        assert!(matches!(err, SolverError::Numeric { .. }));
    }
}
