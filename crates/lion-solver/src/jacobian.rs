//! Finite difference Jacobian computation.

use crate::error::SolverResult;
use nalgebra::{SMatrix, SVector};

/// Relative perturbation used when no other value is supplied.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Compute Jacobian using central finite differences.
///
/// Column `j` is `(f(x + dx e_j) - f(x - dx e_j)) / (2 dx)` with
/// `dx = epsilon * max(|x_j|, 1)`. Everything lives on the stack.
pub fn central_difference_jacobian<const N: usize, const M: usize, F>(
    x: &SVector<f64, N>,
    mut f: F,
    epsilon: f64,
) -> SolverResult<SMatrix<f64, M, N>>
where
    F: FnMut(&SVector<f64, N>) -> SolverResult<SVector<f64, M>>,
{
    let mut jac = SMatrix::<f64, M, N>::zeros();

    for j in 0..N {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = *x;
        x_plus[j] += dx;
        let f_plus = f(&x_plus)?;

        let mut x_minus = *x;
        x_minus[j] -= dx;
        let f_minus = f(&x_minus)?;

        jac.set_column(j, &((f_plus - f_minus) / (2.0 * dx)));
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Vector1, Vector2};

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &Vector1<f64>| -> SolverResult<Vector1<f64>> { Ok(Vector1::new(2.0 * x[0])) };

        let x = Vector1::new(3.0);
        let jac = central_difference_jacobian(&x, f, 1e-7).unwrap();

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn jacobian_coupled_pair() {
        // f(x, y) = (x*y, x^2 + 3y)
        let f = |v: &Vector2<f64>| -> SolverResult<Vector2<f64>> {
            Ok(Vector2::new(v[0] * v[1], v[0] * v[0] + 3.0 * v[1]))
        };

        let x = Vector2::new(2.0, -1.5);
        let jac = central_difference_jacobian(&x, f, DEFAULT_EPSILON).unwrap();

        assert!((jac[(0, 0)] + 1.5).abs() < 1e-6);
        assert!((jac[(0, 1)] - 2.0).abs() < 1e-6);
        assert!((jac[(1, 0)] - 4.0).abs() < 1e-6);
        assert!((jac[(1, 1)] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn evaluation_error_propagates() {
        let f = |_: &Vector1<f64>| -> SolverResult<Vector1<f64>> {
            Err(crate::SolverError::Evaluation {
                what: "boom".to_string(),
            })
        };
        assert!(central_difference_jacobian(&Vector1::new(0.0), f, 1e-6).is_err());
    }
}
