//! Bracketing scalar minimizers.
//!
//! All three algorithms share the same contract: a finite bracket `[a, b]`,
//! a starting abscissa, and a [`MinimizeConfig`]. They stop when the bracket
//! passes [`MinimizeConfig::interval_converged`] and fail with
//! [`SolverError::ConvergenceFailed`] once the iteration cap is hit.
//!
//! None of them allocate, so they can sit inside an ODE right-hand side.

mod brent;
mod config;
mod golden;
mod quad_golden;

pub use config::{ConfigError, MinimizeConfig};

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};

/// Fraction of a segment taken by a golden-section step: `(3 - √5) / 2`.
const GOLDEN: f64 = 0.381_966_011_250_105_1;

/// Square root of machine epsilon, the resolution of a smooth minimum.
const SQRT_EPSILON: f64 = 1.490_116_119_384_765_6e-8;

/// Minimization algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinimizerKind {
    /// Plain golden-section search.
    GoldenSection,
    /// Brent's parabolic interpolation with golden-section fallback.
    #[default]
    Brent,
    /// Safeguarded quadratic fit with forced golden steps on stalls.
    QuadGolden,
}

impl MinimizerKind {
    pub const ALL: [MinimizerKind; 3] = [
        MinimizerKind::GoldenSection,
        MinimizerKind::Brent,
        MinimizerKind::QuadGolden,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MinimizerKind::GoldenSection => "golden_section",
            MinimizerKind::Brent => "brent",
            MinimizerKind::QuadGolden => "quad_golden",
        }
    }
}

/// Result of a successful minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub x: f64,
    pub fx: f64,
    pub iterations: usize,
}

/// A configured minimizer, reusable across calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimizer {
    kind: MinimizerKind,
    config: MinimizeConfig,
}

impl Minimizer {
    pub fn new(kind: MinimizerKind, config: MinimizeConfig) -> Self {
        Self { kind, config }
    }

    pub fn kind(&self) -> MinimizerKind {
        self.kind
    }

    pub fn config(&self) -> &MinimizeConfig {
        &self.config
    }

    /// Minimize `f` over `bracket`, starting from `guess`.
    ///
    /// A guess outside the open bracket is replaced by the golden point of
    /// the bracket. NaN objective values are treated as `+inf`.
    ///
    /// # Errors
    ///
    /// [`SolverError::ProblemSetup`] for a non-finite or empty bracket and
    /// [`SolverError::ConvergenceFailed`] when `max_iters` is exhausted.
    pub fn minimize<F>(&self, f: F, bracket: [f64; 2], guess: f64) -> SolverResult<Minimum>
    where
        F: FnMut(f64) -> f64,
    {
        let [a, b] = bracket;
        if !a.is_finite() || !b.is_finite() {
            return Err(SolverError::ProblemSetup {
                what: format!("non-finite bracket [{a}, {b}]"),
            });
        }
        let (lower, upper) = if a <= b { (a, b) } else { (b, a) };
        if lower == upper {
            return Err(SolverError::ProblemSetup {
                what: format!("empty bracket [{lower}, {upper}]"),
            });
        }

        let x0 = if guess.is_finite() && guess > lower && guess < upper {
            guess
        } else {
            lower + GOLDEN * (upper - lower)
        };

        let mut eval = Objective(f);
        let outcome = match self.kind {
            MinimizerKind::GoldenSection => golden::search(&mut eval, lower, upper, x0, &self.config),
            MinimizerKind::Brent => brent::search(&mut eval, lower, upper, x0, &self.config),
            MinimizerKind::QuadGolden => {
                quad_golden::search(&mut eval, lower, upper, x0, &self.config)
            }
        };

        match outcome {
            Search::Converged(min) => Ok(min),
            Search::Exhausted { lower, upper, x } => Err(SolverError::ConvergenceFailed {
                what: format!(
                    "{} did not converge in {} iterations (bracket [{lower}, {upper}], x = {x})",
                    self.kind.name(),
                    self.config.max_iters()
                ),
            }),
        }
    }
}

/// Internal search outcome; formatting is left to the caller.
enum Search {
    Converged(Minimum),
    Exhausted { lower: f64, upper: f64, x: f64 },
}

/// Objective wrapper that maps NaN to `+inf`.
struct Objective<F>(F);

impl<F: FnMut(f64) -> f64> Objective<F> {
    #[inline]
    fn eval(&mut self, x: f64) -> f64 {
        let v = (self.0)(x);
        if v.is_nan() { f64::INFINITY } else { v }
    }
}
