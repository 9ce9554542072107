//! Nominal and usable capacity.
//!
//! Cold cells cannot deliver their full nominal capacity. The missing part is
//! taken from the bottom of the charge range, so the usable state of charge
//! reaches zero before the nominal one does.

use crate::params::CellParams;

/// Capacity of the aged cell (Ah).
#[inline]
pub fn nominal_capacity(soh: f64, params: &CellParams) -> f64 {
    params.capacity.nominal_ah * soh
}

/// Capacity available at the present conductivity (Ah), never above nominal.
#[inline]
pub fn usable_capacity(capacity_nominal: f64, kappa: f64, params: &CellParams) -> f64 {
    capacity_nominal * kappa.powf(params.capacity.temperature_exponent).min(1.0)
}

/// State of charge relative to the usable capacity, clamped at zero.
#[inline]
pub fn usable_soc(soc_nominal: f64, capacity_nominal: f64, capacity_use: f64) -> f64 {
    if capacity_use <= 0.0 {
        return 0.0;
    }
    (1.0 - (1.0 - soc_nominal) * capacity_nominal / capacity_use).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_cell_uses_full_capacity() {
        let p = CellParams::generic();
        let c = nominal_capacity(1.0, &p);
        assert_eq!(usable_capacity(c, 1.3, &p), c);
        assert_eq!(usable_soc(0.7, c, c), 0.7);
    }

    #[test]
    fn cold_cell_loses_the_bottom_of_the_range() {
        let p = CellParams::generic();
        let c = nominal_capacity(1.0, &p);
        let cu = usable_capacity(c, 0.64, &p);
        assert!((cu - 0.8 * c).abs() < 1e-12);
        assert_eq!(usable_soc(1.0, c, cu), 1.0);
        assert!((usable_soc(0.6, c, cu) - 0.5).abs() < 1e-12);
        assert_eq!(usable_soc(0.1, c, cu), 0.0);
    }

    #[test]
    fn soh_scales_nominal_capacity() {
        let p = CellParams::generic();
        assert!((nominal_capacity(0.9, &p) - 2.7).abs() < 1e-12);
    }
}
