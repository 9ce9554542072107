//! Internal resistance and electrolyte conductivity.

use crate::params::CellParams;

/// Conductivity factor `exp(activation·(1/T_ref - 1/T))`, 1 at the reference
/// temperature.
#[inline]
pub fn kappa(temperature: f64, params: &CellParams) -> f64 {
    let t_ref = params.thermal.reference_temperature;
    (params.conductivity.activation * (1.0 / t_ref - 1.0 / temperature)).exp()
}

/// Resistance at the reference temperature (ohm).
#[inline]
pub fn reference_resistance(soc: f64, params: &CellParams) -> f64 {
    let r = &params.resistance;
    r.r0 + r.r1 * (-r.r2 * soc).exp()
}

/// Internal resistance `R_ref(soc) / kappa` (ohm).
#[inline]
pub fn internal_resistance(soc: f64, kappa: f64, params: &CellParams) -> f64 {
    reference_resistance(soc, params) / kappa
}

/// `dR/dsoc` at fixed temperature.
#[inline]
pub fn resistance_gradient_wrt_soc(soc: f64, kappa: f64, params: &CellParams) -> f64 {
    let r = &params.resistance;
    -r.r1 * r.r2 * (-r.r2 * soc).exp() / kappa
}

/// `dR/dT` at fixed state of charge, given the resistance at `temperature`.
#[inline]
pub fn resistance_gradient_wrt_temperature(
    resistance: f64,
    temperature: f64,
    params: &CellParams,
) -> f64 {
    -resistance * params.conductivity.activation / (temperature * temperature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kappa_is_one_at_reference() {
        let p = CellParams::generic();
        assert_eq!(kappa(p.thermal.reference_temperature, &p), 1.0);
        assert!(kappa(318.15, &p) > 1.0);
        assert!(kappa(273.15, &p) < 1.0);
    }

    #[test]
    fn colder_cell_has_higher_resistance() {
        let p = CellParams::generic();
        let warm = internal_resistance(0.5, kappa(310.0, &p), &p);
        let cold = internal_resistance(0.5, kappa(260.0, &p), &p);
        assert!(cold > warm);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let p = CellParams::generic();
        let (soc, t) = (0.4, 290.0);
        let h = 1e-6;

        let k = kappa(t, &p);
        let d_soc = (internal_resistance(soc + h, k, &p) - internal_resistance(soc - h, k, &p))
            / (2.0 * h);
        assert!((d_soc - resistance_gradient_wrt_soc(soc, k, &p)).abs() < 1e-8);

        let ht = 1e-4;
        let r_at = |t: f64| internal_resistance(soc, kappa(t, &p), &p);
        let d_t = (r_at(t + ht) - r_at(t - ht)) / (2.0 * ht);
        let analytic = resistance_gradient_wrt_temperature(r_at(t), t, &p);
        assert!((d_t - analytic).abs() < 1e-9, "{d_t} vs {analytic}");
    }
}
