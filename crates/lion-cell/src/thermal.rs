//! Entropic heat, heat generation and core-surface-ambient exchange.

use crate::params::CellParams;

/// Entropic heat coefficient (V/K).
#[inline]
pub fn ehc(soc: f64, params: &CellParams) -> f64 {
    let e = &params.ehc;
    let z = (soc - e.mu) / e.sigma;
    e.a + e.b * (-z * z).exp()
}

/// `d ehc / d soc`.
#[inline]
pub fn ehc_gradient(soc: f64, params: &CellParams) -> f64 {
    let e = &params.ehc;
    let z = (soc - e.mu) / e.sigma;
    -2.0 * e.b * z / e.sigma * (-z * z).exp()
}

/// Open-circuit voltage corrected from the reference temperature.
#[inline]
pub fn corrected_ocv(ref_ocv: f64, ehc: f64, temperature: f64, params: &CellParams) -> f64 {
    ref_ocv + ehc * (temperature - params.thermal.reference_temperature)
}

/// Ohmic plus reversible heat (W); positive current discharges.
#[inline]
pub fn generated_heat(current: f64, resistance: f64, temperature: f64, ehc: f64) -> f64 {
    current * current * resistance - current * temperature * ehc
}

/// Total core to ambient thermal resistance (K/W).
#[inline]
pub fn thermal_resistance(params: &CellParams) -> f64 {
    params.thermal.rin + params.thermal.rout
}

/// Surface temperature on the core-ambient resistor divider (K).
#[inline]
pub fn surface_temperature(temperature: f64, ambient: f64, params: &CellParams) -> f64 {
    ambient + (temperature - ambient) * params.thermal.rout / thermal_resistance(params)
}

/// Rate of change of the internal temperature (K/s).
#[inline]
pub fn temperature_rate(heat: f64, temperature: f64, ambient: f64, params: &CellParams) -> f64 {
    (heat - (temperature - ambient) / thermal_resistance(params)) / params.thermal.cp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ehc_peaks_at_mu() {
        let p = CellParams::generic();
        let peak = ehc(p.ehc.mu, &p);
        assert!((peak - (p.ehc.a + p.ehc.b)).abs() < 1e-18);
        assert!(ehc(p.ehc.mu - 0.1, &p) < peak);
        assert!(ehc(p.ehc.mu + 0.1, &p) < peak);
        assert_eq!(ehc_gradient(p.ehc.mu, &p), 0.0);
    }

    #[test]
    fn ehc_gradient_matches_finite_difference() {
        let p = CellParams::generic();
        let h = 1e-6;
        for soc in [0.1, 0.45, 0.7, 0.95] {
            let numeric = (ehc(soc + h, &p) - ehc(soc - h, &p)) / (2.0 * h);
            assert!((numeric - ehc_gradient(soc, &p)).abs() < 1e-12);
        }
    }

    #[test]
    fn surface_lies_between_core_and_ambient() {
        let p = CellParams::generic();
        let ts = surface_temperature(320.0, 300.0, &p);
        assert!(ts > 300.0 && ts < 320.0);
        assert_eq!(surface_temperature(300.0, 300.0, &p), 300.0);
    }

    #[test]
    fn no_heat_no_gradient_is_steady() {
        let p = CellParams::generic();
        assert_eq!(temperature_rate(0.0, 300.0, 300.0, &p), 0.0);
        assert!(temperature_rate(0.0, 310.0, 300.0, &p) < 0.0);
        assert!(temperature_rate(2.0, 300.0, 300.0, &p) > 0.0);
    }

    #[test]
    fn reversible_heat_flips_with_current() {
        let charge = generated_heat(-1.0, 0.0, 300.0, 1e-4);
        let discharge = generated_heat(1.0, 0.0, 300.0, 1e-4);
        assert_eq!(charge, -discharge);
    }
}
