use crate::LionError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, LionError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(LionError::NonFinite { what, value: v })
    }
}

/// Finite and `>= 0`.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, LionError> {
    ensure_in_range(v, what, 0.0, Real::INFINITY)
}

/// Finite and `> 0`.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, LionError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(LionError::OutOfRange {
            what,
            value: v,
            min: Real::MIN_POSITIVE,
            max: Real::INFINITY,
        })
    }
}

pub fn ensure_in_range(
    v: Real,
    what: &'static str,
    min: Real,
    max: Real,
) -> Result<Real, LionError> {
    let v = ensure_finite(v, what)?;
    if v < min || v > max {
        return Err(LionError::OutOfRange {
            what,
            value: v,
            min,
            max,
        });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn range_checks() {
        assert!(ensure_non_negative(0.0, "x").is_ok());
        assert!(ensure_non_negative(-1e-300, "x").is_err());
        assert!(ensure_positive(0.0, "x").is_err());
        assert!(ensure_positive(2.0, "x").is_ok());
        assert!(ensure_in_range(1.5, "x", 0.0, 1.0).is_err());
        assert!(ensure_in_range(Real::INFINITY, "x", 0.0, Real::INFINITY).is_err());
    }
}
