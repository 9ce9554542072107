use lion_solver::{MinimizeConfig, Minimizer, MinimizerKind};
use proptest::prelude::*;

proptest! {
    #[test]
    fn shifted_parabola_minimum_is_found(
        center in -900.0_f64..900.0,
        curvature in 1e-3_f64..1e3,
        guess in -999.0_f64..999.0,
    ) {
        let config = MinimizeConfig::new(200, 1e-6, 1e-6).unwrap();
        for kind in MinimizerKind::ALL {
            let m = Minimizer::new(kind, config);
            let min = m
                .minimize(|x| curvature * (x - center) * (x - center), [-1000.0, 1000.0], guess)
                .unwrap();
            prop_assert!(
                (min.x - center).abs() < 1e-4 * (1.0 + center.abs()),
                "{:?}: {} vs {}", kind, min.x, center
            );
        }
    }

    #[test]
    fn squared_residual_of_quadratic_root(
        power in 0.0_f64..20.0,
        ocv in 3.0_f64..4.2,
        resistance in 0.01_f64..0.2,
    ) {
        // Same shape as the current balance: (P - (V - iR) i)^2.
        let i_max = ocv / (2.0 * resistance);
        prop_assume!(power < 0.9 * ocv * ocv / (4.0 * resistance));
        let config = MinimizeConfig::new(200, 1e-9, 1e-9).unwrap();
        for kind in MinimizerKind::ALL {
            let m = Minimizer::new(kind, config);
            let min = m
                .minimize(
                    |i| {
                        let g = power - (ocv - i * resistance) * i;
                        g * g
                    },
                    [-1000.0, i_max.min(1000.0)],
                    0.0,
                )
                .unwrap();
            let balance = (ocv - min.x * resistance) * min.x;
            prop_assert!((balance - power).abs() < 1e-5, "{:?}: {}", kind, balance);
        }
    }
}
