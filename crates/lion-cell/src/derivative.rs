//! Right-hand side of the two-state cell model and its analytical Jacobian.
//!
//! The integrated pair is `(soc_nominal, internal_temperature)`. Evaluating
//! it resolves the current for the requested power, then derives heat and
//! the two rates:
//!
//! - `dsoc/dt = -i / (3600·C_nom)`
//! - `dT/dt = (q - (T - T_amb)/(rin + rout)) / cp`
//!
//! Nothing here allocates; the whole path runs inside every integrator
//! right-hand-side call.

use crate::capacity::{nominal_capacity, usable_capacity, usable_soc};
use crate::current::{current_gradient_wrt_ocv, current_gradient_wrt_resistance, resolve_current};
use crate::error::{CellError, CellResult, check_finite};
use crate::ocv::{voltage_ocv, voltage_ocv_gradient};
use crate::params::CellParams;
use crate::resistance::{
    internal_resistance, kappa, resistance_gradient_wrt_soc, resistance_gradient_wrt_temperature,
};
use crate::thermal::{
    corrected_ocv, ehc, ehc_gradient, generated_heat, surface_temperature, temperature_rate,
    thermal_resistance,
};
use lion_core::amp_hours_to_coulombs;
use lion_solver::Minimizer;
use nalgebra::Matrix2;

/// Inputs held fixed while the state is integrated over one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operating {
    /// Requested power (W), positive discharges.
    pub power: f64,
    /// Ambient temperature (K).
    pub ambient_temperature: f64,
    pub soh: f64,
    /// Seed for the current solve.
    pub current_guess: f64,
}

/// Every instantaneous quantity at one state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Evaluation {
    pub soc: f64,
    pub temperature: f64,
    pub current: f64,
    /// Terminal voltage (V).
    pub voltage: f64,
    pub ref_open_circuit_voltage: f64,
    pub open_circuit_voltage: f64,
    pub internal_resistance: f64,
    pub kappa: f64,
    pub ehc: f64,
    pub generated_heat: f64,
    pub surface_temperature: f64,
    pub capacity_nominal: f64,
    pub capacity_use: f64,
    pub soc_use: f64,
    pub dsoc_dt: f64,
    pub dtemp_dt: f64,
}

/// Evaluate the cell at `(soc, temperature)`.
///
/// # Errors
///
/// [`CellError::NonPhysical`] for a negative state of charge, a non-positive
/// temperature or any non-finite intermediate; current-solve failures as
/// returned by [`resolve_current`].
pub fn evaluate(
    params: &CellParams,
    minimizer: &Minimizer,
    operating: &Operating,
    soc: f64,
    temperature: f64,
) -> CellResult<Evaluation> {
    check_finite(soc, "state of charge")?;
    check_finite(temperature, "internal temperature")?;
    if soc < 0.0 {
        return Err(CellError::NonPhysical {
            what: "negative state of charge",
        });
    }
    if temperature <= 0.0 {
        return Err(CellError::NonPhysical {
            what: "non-positive internal temperature",
        });
    }

    let kappa = kappa(temperature, params);
    let ref_ocv = voltage_ocv(soc, params);
    let ehc = ehc(soc, params);
    let ocv = corrected_ocv(ref_ocv, ehc, temperature, params);
    let resistance = internal_resistance(soc, kappa, params);

    let current = resolve_current(
        operating.power,
        ocv,
        resistance,
        operating.current_guess,
        minimizer,
    )?;

    let capacity_nominal = nominal_capacity(operating.soh, params);
    let capacity_use = usable_capacity(capacity_nominal, kappa, params);
    let heat = generated_heat(current, resistance, temperature, ehc);
    let ambient = operating.ambient_temperature;

    let eval = Evaluation {
        soc,
        temperature,
        current,
        voltage: ocv - current * resistance,
        ref_open_circuit_voltage: ref_ocv,
        open_circuit_voltage: ocv,
        internal_resistance: resistance,
        kappa,
        ehc,
        generated_heat: heat,
        surface_temperature: surface_temperature(temperature, ambient, params),
        capacity_nominal,
        capacity_use,
        soc_use: usable_soc(soc, capacity_nominal, capacity_use),
        dsoc_dt: -current / amp_hours_to_coulombs(capacity_nominal),
        dtemp_dt: temperature_rate(heat, temperature, ambient, params),
    };
    check_finite(eval.dsoc_dt, "state of charge rate")?;
    check_finite(eval.dtemp_dt, "temperature rate")?;
    Ok(eval)
}

impl Evaluation {
    /// The rates as `[dsoc/dt, dT/dt]`.
    pub fn rates(&self) -> [f64; 2] {
        [self.dsoc_dt, self.dtemp_dt]
    }

    /// Analytical `d(rates)/d(soc, T)` at this evaluation.
    ///
    /// The current enters through implicit differentiation of the power
    /// balance; `ocv` depends on `soc` directly and through the entropic
    /// correction, `R` through `soc` and `kappa(T)`.
    pub fn jacobian(&self, params: &CellParams) -> Matrix2<f64> {
        let (soc, t, i) = (self.soc, self.temperature, self.current);
        let (ocv, r, e) = (
            self.open_circuit_voltage,
            self.internal_resistance,
            self.ehc,
        );
        let t_ref = params.thermal.reference_temperature;

        let docv_dsoc = voltage_ocv_gradient(soc, params) + ehc_gradient(soc, params) * (t - t_ref);
        let docv_dt = e;
        let dr_dsoc = resistance_gradient_wrt_soc(soc, self.kappa, params);
        let dr_dt = resistance_gradient_wrt_temperature(r, t, params);

        let di_docv = current_gradient_wrt_ocv(i, ocv, r);
        let di_dr = current_gradient_wrt_resistance(i, ocv, r);
        let di_dsoc = di_docv * docv_dsoc + di_dr * dr_dsoc;
        let di_dt = di_docv * docv_dt + di_dr * dr_dt;

        let charge_scale = -1.0 / amp_hours_to_coulombs(self.capacity_nominal);

        let dq_dsoc = 2.0 * i * r * di_dsoc + i * i * dr_dsoc
            - t * (e * di_dsoc + i * ehc_gradient(soc, params));
        let dq_dt = 2.0 * i * r * di_dt + i * i * dr_dt - e * (i + t * di_dt);

        let cp = params.thermal.cp;
        Matrix2::new(
            charge_scale * di_dsoc,
            charge_scale * di_dt,
            dq_dsoc / cp,
            (dq_dt - 1.0 / thermal_resistance(params)) / cp,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lion_solver::{MinimizeConfig, MinimizerKind};

    fn minimizer() -> Minimizer {
        Minimizer::new(MinimizerKind::Brent, MinimizeConfig::default())
    }

    fn operating(power: f64, ambient: f64) -> Operating {
        Operating {
            power,
            ambient_temperature: ambient,
            soh: 1.0,
            current_guess: 0.0,
        }
    }

    #[test]
    fn discharge_lowers_soc_and_heats() {
        let p = CellParams::generic();
        let e = evaluate(&p, &minimizer(), &operating(10.0, 298.15), 0.8, 298.15).unwrap();
        assert!(e.current > 0.0);
        assert!(e.dsoc_dt < 0.0);
        assert!(e.generated_heat > 0.0);
        assert!(e.dtemp_dt > 0.0);
        assert!((e.voltage * e.current - 10.0).abs() < 1e-9);
    }

    #[test]
    fn no_load_at_ambient_is_steady() {
        let p = CellParams::generic();
        let e = evaluate(&p, &minimizer(), &operating(0.0, 300.0), 0.5, 300.0).unwrap();
        assert!(e.current.abs() < 1e-12);
        assert!(e.dsoc_dt.abs() < 1e-15);
        assert!(e.dtemp_dt.abs() < 1e-12);
        assert!((e.voltage - e.open_circuit_voltage).abs() < 1e-12);
    }

    #[test]
    fn negative_soc_is_non_physical() {
        let p = CellParams::generic();
        assert!(matches!(
            evaluate(&p, &minimizer(), &operating(1.0, 298.15), -0.01, 298.15),
            Err(CellError::NonPhysical { .. })
        ));
    }

    #[test]
    fn excessive_power_is_a_power_limit() {
        let p = CellParams::generic();
        assert!(matches!(
            evaluate(&p, &minimizer(), &operating(1e4, 298.15), 0.5, 298.15),
            Err(CellError::PowerLimit { .. })
        ));
    }

    #[test]
    fn rate_uses_aged_capacity() {
        let p = CellParams::generic();
        let mut op = operating(5.0, 298.15);
        let fresh = evaluate(&p, &minimizer(), &op, 0.7, 298.15).unwrap();
        op.soh = 0.5;
        let aged = evaluate(&p, &minimizer(), &op, 0.7, 298.15).unwrap();
        assert!((aged.dsoc_dt - 2.0 * fresh.dsoc_dt).abs() < 1e-15);
    }
}
