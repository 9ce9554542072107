//! Cell parameter set.
//!
//! Parameters are immutable for the lifetime of a simulation. They are plain
//! `f64` records so they serialize directly into project files; temperatures
//! are in kelvin, capacities in ampere-hours.

use crate::error::{CellError, CellResult};
use lion_core::{ensure_finite, ensure_in_range, ensure_non_negative, ensure_positive};
use serde::{Deserialize, Serialize};

/// Open-circuit voltage curve coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OcvParams {
    /// Voltage at full charge (V).
    pub v0: f64,
    /// Plateau voltage (V).
    pub vl: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Reference resistance `r0 + r1·exp(-r2·soc)` in ohm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistanceParams {
    pub r0: f64,
    pub r1: f64,
    pub r2: f64,
}

/// Arrhenius-style conductivity shift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductivityParams {
    /// Activation temperature (K).
    pub activation: f64,
}

/// Entropic heat coefficient `a + b·exp(-((soc - mu)/sigma)^2)` in V/K.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EhcParams {
    pub a: f64,
    pub b: f64,
    pub mu: f64,
    pub sigma: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalParams {
    /// Heat capacity (J/K).
    pub cp: f64,
    /// Core to surface thermal resistance (K/W).
    pub rin: f64,
    /// Surface to ambient thermal resistance (K/W).
    pub rout: f64,
    /// Temperature at which `kappa == 1` and the OCV curve was measured (K).
    pub reference_temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityParams {
    /// Fresh cell capacity (Ah).
    pub nominal_ah: f64,
    /// Exponent applied to `kappa` for the usable capacity.
    pub temperature_exponent: f64,
}

/// Per-cycle capacity fade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationParams {
    pub fade_rate: f64,
    pub depth_exponent: f64,
    pub mean_soc_coefficient: f64,
}

/// Initial conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitParams {
    pub soc: f64,
    /// Internal temperature (K).
    pub internal_temperature: f64,
    pub soh: f64,
}

/// Complete parameter set for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellParams {
    pub ocv: OcvParams,
    pub resistance: ResistanceParams,
    pub conductivity: ConductivityParams,
    pub ehc: EhcParams,
    pub thermal: ThermalParams,
    pub capacity: CapacityParams,
    pub degradation: DegradationParams,
    pub init: InitParams,
}

impl Default for CellParams {
    fn default() -> Self {
        Self::generic()
    }
}

impl CellParams {
    /// A generic 3 Ah cylindrical cell.
    pub fn generic() -> Self {
        Self {
            ocv: OcvParams {
                v0: 4.2,
                vl: 3.6,
                alpha: 0.1,
                beta: 17.0,
                gamma: 12.0,
            },
            resistance: ResistanceParams {
                r0: 0.03,
                r1: 0.02,
                r2: 5.0,
            },
            conductivity: ConductivityParams { activation: 1500.0 },
            ehc: EhcParams {
                a: -5e-5,
                b: 1.5e-4,
                mu: 0.6,
                sigma: 0.2,
            },
            thermal: ThermalParams {
                cp: 45.0,
                rin: 3.0,
                rout: 12.0,
                reference_temperature: 298.15,
            },
            capacity: CapacityParams {
                nominal_ah: 3.0,
                temperature_exponent: 0.5,
            },
            degradation: DegradationParams {
                fade_rate: 2e-4,
                depth_exponent: 1.5,
                mean_soc_coefficient: 1.0,
            },
            init: InitParams {
                soc: 0.9,
                internal_temperature: 298.15,
                soh: 1.0,
            },
        }
    }

    /// Reject non-finite or non-physical values.
    pub fn validate(&self) -> CellResult<()> {
        let finite = [
            (self.ocv.v0, "ocv.v0"),
            (self.ocv.vl, "ocv.vl"),
            (self.ocv.alpha, "ocv.alpha"),
            (self.ocv.beta, "ocv.beta"),
            (self.ocv.gamma, "ocv.gamma"),
            (self.resistance.r0, "resistance.r0"),
            (self.resistance.r1, "resistance.r1"),
            (self.resistance.r2, "resistance.r2"),
            (self.conductivity.activation, "conductivity.activation"),
            (self.ehc.a, "ehc.a"),
            (self.ehc.b, "ehc.b"),
            (self.ehc.mu, "ehc.mu"),
            (self.ehc.sigma, "ehc.sigma"),
            (self.capacity.temperature_exponent, "capacity.temperature_exponent"),
            (self.degradation.mean_soc_coefficient, "degradation.mean_soc_coefficient"),
        ];
        for (value, what) in finite {
            ensure_finite(value, what).map_err(|_| CellError::InvalidParameter { what })?;
        }

        let positive = [
            (self.ocv.v0, "ocv.v0"),
            (self.ocv.vl, "ocv.vl"),
            (self.ehc.sigma, "ehc.sigma"),
            (self.thermal.cp, "thermal.cp"),
            (self.thermal.reference_temperature, "thermal.reference_temperature"),
            (self.capacity.nominal_ah, "capacity.nominal_ah"),
            (self.init.internal_temperature, "init.internal_temperature"),
        ];
        for (value, what) in positive {
            ensure_positive(value, what).map_err(|_| CellError::InvalidParameter { what })?;
        }

        let non_negative = [
            (self.resistance.r1, "resistance.r1"),
            (self.thermal.rin, "thermal.rin"),
            (self.thermal.rout, "thermal.rout"),
            (self.degradation.fade_rate, "degradation.fade_rate"),
            (self.degradation.depth_exponent, "degradation.depth_exponent"),
        ];
        for (value, what) in non_negative {
            ensure_non_negative(value, what).map_err(|_| CellError::InvalidParameter { what })?;
        }

        if self.resistance.r0 <= 0.0 {
            return Err(CellError::InvalidParameter {
                what: "resistance.r0 must be positive",
            });
        }
        if self.thermal.rin + self.thermal.rout <= 0.0 {
            return Err(CellError::InvalidParameter {
                what: "thermal.rin + thermal.rout must be positive",
            });
        }
        if self.ocv.v0 < self.ocv.vl {
            return Err(CellError::InvalidParameter {
                what: "ocv.v0 must not be below ocv.vl",
            });
        }
        ensure_in_range(self.init.soc, "init.soc", 0.0, 1.0)
            .map_err(|_| CellError::InvalidParameter { what: "init.soc" })?;
        if !(self.init.soh > 0.0 && self.init.soh <= 1.0) {
            return Err(CellError::InvalidParameter { what: "init.soh" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_is_valid() {
        CellParams::generic().validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let mut p = CellParams::generic();
        p.thermal.cp = 0.0;
        assert_eq!(
            p.validate(),
            Err(CellError::InvalidParameter { what: "thermal.cp" })
        );

        let mut p = CellParams::generic();
        p.ocv.gamma = f64::NAN;
        assert_eq!(
            p.validate(),
            Err(CellError::InvalidParameter { what: "ocv.gamma" })
        );

        let mut p = CellParams::generic();
        p.init.soc = 1.2;
        assert!(p.validate().is_err());

        let mut p = CellParams::generic();
        p.init.soh = 0.0;
        assert!(p.validate().is_err());

        let mut p = CellParams::generic();
        p.degradation.fade_rate = -1e-3;
        assert!(p.validate().is_err());
    }

    #[test]
    fn generic_open_circuit_at_full_charge_is_v0() {
        let p = CellParams::generic();
        let v = crate::ocv::voltage_ocv(1.0, &p);
        assert!((v - p.ocv.v0).abs() < 1e-12);
    }
}
