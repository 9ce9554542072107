use thiserror::Error;

/// Configuration shared by all bracketing minimizers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeConfig {
    max_iters: usize,
    x_abs_tol: f64,
    x_rel_tol: f64,
}

/// Errors that can occur when validating a minimizer config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_iters must be positive")]
    MaxIters,

    #[error("x_abs_tol must be finite and non-negative")]
    XAbs,

    #[error("x_rel_tol must be finite and non-negative")]
    XRel,

    #[error("x_abs_tol and x_rel_tol cannot both be zero")]
    ZeroTolerance,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            x_abs_tol: 1e-6,
            x_rel_tol: 1e-6,
        }
    }
}

impl MinimizeConfig {
    /// Creates a new config with validated tolerances.
    ///
    /// # Errors
    ///
    /// Returns an error if the iteration cap is zero, if a tolerance is
    /// negative or non-finite, or if both tolerances are zero.
    pub fn new(max_iters: usize, x_abs_tol: f64, x_rel_tol: f64) -> Result<Self, ConfigError> {
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if !x_abs_tol.is_finite() || x_abs_tol < 0.0 {
            return Err(ConfigError::XAbs);
        }
        if !x_rel_tol.is_finite() || x_rel_tol < 0.0 {
            return Err(ConfigError::XRel);
        }
        if x_abs_tol == 0.0 && x_rel_tol == 0.0 {
            return Err(ConfigError::ZeroTolerance);
        }

        Ok(Self {
            max_iters,
            x_abs_tol,
            x_rel_tol,
        })
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the absolute tolerance for x convergence.
    #[must_use]
    pub fn x_abs_tol(&self) -> f64 {
        self.x_abs_tol
    }

    /// Returns the relative tolerance for x convergence.
    #[must_use]
    pub fn x_rel_tol(&self) -> f64 {
        self.x_rel_tol
    }

    /// Interval convergence test on `[lower, upper]`.
    ///
    /// The relative part is measured against the endpoint closest to zero,
    /// and dropped when the interval straddles zero. An interval that has
    /// collapsed to floating-point resolution also counts as converged.
    #[must_use]
    pub fn interval_converged(&self, lower: f64, upper: f64) -> bool {
        let width = (upper - lower).abs();
        let min_abs = if (lower > 0.0 && upper > 0.0) || (lower < 0.0 && upper < 0.0) {
            lower.abs().min(upper.abs())
        } else {
            0.0
        };

        if width < self.x_abs_tol + self.x_rel_tol * min_abs {
            return true;
        }
        width <= 4.0 * f64::EPSILON * lower.abs().max(upper.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_values() {
        assert_eq!(MinimizeConfig::new(0, 1e-6, 0.0), Err(ConfigError::MaxIters));
        assert_eq!(MinimizeConfig::new(10, -1.0, 0.0), Err(ConfigError::XAbs));
        assert_eq!(MinimizeConfig::new(10, 0.0, f64::NAN), Err(ConfigError::XRel));
        assert_eq!(
            MinimizeConfig::new(10, 0.0, 0.0),
            Err(ConfigError::ZeroTolerance)
        );
        assert!(MinimizeConfig::new(10, 0.0, 1e-8).is_ok());
    }

    #[test]
    fn straddling_interval_uses_absolute_tolerance_only() {
        let config = MinimizeConfig::new(10, 1e-3, 1.0).unwrap();
        assert!(!config.interval_converged(-0.1, 0.1));
        assert!(config.interval_converged(-1e-4, 1e-4));
    }

    #[test]
    fn relative_tolerance_uses_smaller_endpoint() {
        let config = MinimizeConfig::new(10, 0.0, 1e-3).unwrap();
        assert!(config.interval_converged(100.0, 100.05));
        assert!(!config.interval_converged(100.0, 100.2));
        assert!(config.interval_converged(-100.05, -100.0));
    }
}
