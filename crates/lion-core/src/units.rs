use uom::si::f64::{
    ElectricCharge as UomElectricCharge, ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Charge = UomElectricCharge;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn amp_hours(v: f64) -> Charge {
    use uom::si::electric_charge::ampere_hour;
    Charge::new::<ampere_hour>(v)
}

/// Degrees Celsius to kelvin, as a raw value for code that does not carry
/// `uom` quantities.
#[inline]
pub fn celsius_to_kelvin(c: f64) -> f64 {
    use uom::si::thermodynamic_temperature::kelvin;
    celsius(c).get::<kelvin>()
}

#[inline]
pub fn kelvin_to_celsius(t: f64) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    k(t).get::<degree_celsius>()
}

/// Capacity in ampere-hours to charge in coulombs.
#[inline]
pub fn amp_hours_to_coulombs(ah: f64) -> f64 {
    use uom::si::electric_charge::coulomb;
    amp_hours(ah).get::<coulomb>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn celsius_kelvin_conversions() {
        assert!((celsius_to_kelvin(25.0) - 298.15).abs() < 1e-9);
        assert!((celsius_to_kelvin(-40.0) - 233.15).abs() < 1e-9);
        assert!((kelvin_to_celsius(310.15) - 37.0).abs() < 1e-9);
        for c in [-20.0, 0.0, 45.5] {
            assert!((kelvin_to_celsius(celsius_to_kelvin(c)) - c).abs() < 1e-9);
        }
    }

    #[test]
    fn amp_hour_is_3600_coulomb() {
        assert!((amp_hours_to_coulombs(1.0) - 3600.0).abs() < 1e-9);
        assert!((amp_hours_to_coulombs(2.5) - 9000.0).abs() < 1e-9);
    }
}
